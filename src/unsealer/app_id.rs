use md5::Md5;
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::io;
use tracing::debug;

use crate::error::{Error, Result};
use crate::unsealer::login::execute_login;
use crate::vault::VaultClient;

/// Where the app-id user id comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserIdMethod {
    /// Hardware address of a named network interface.
    Mac,
    /// Full contents of a file.
    File,
}

impl UserIdMethod {
    pub fn parse(method: &str) -> Result<Self> {
        match method {
            "mac" => Ok(Self::Mac),
            "file" => Ok(Self::File),
            other => Err(Error::UnknownUserIdMethod(other.to_string())),
        }
    }
}

/// Digest applied to the (optionally salted) user id before it is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashMethod {
    None,
    Md5,
    Sha1,
    Sha256,
}

impl HashMethod {
    /// An empty string means no hashing.
    pub fn parse(method: &str) -> Result<Self> {
        match method {
            "" => Ok(Self::None),
            "md5" => Ok(Self::Md5),
            "sha1" => Ok(Self::Sha1),
            "sha256" => Ok(Self::Sha256),
            other => Err(Error::UnknownHashMethod(other.to_string())),
        }
    }

    /// Hex digest of the raw bytes of `salt$user_id` (or of `user_id` when the
    /// salt is empty). [`HashMethod::None`] returns the user id as text, unsalted.
    pub fn apply(self, user_id: &[u8], salt: &str) -> String {
        let digest: fn(&[u8]) -> String = match self {
            Self::None => return String::from_utf8_lossy(user_id).into_owned(),
            Self::Md5 => digest_hex::<Md5>,
            Self::Sha1 => digest_hex::<Sha1>,
            Self::Sha256 => digest_hex::<Sha256>,
        };
        let mut input = Vec::with_capacity(salt.len() + 1 + user_id.len());
        if !salt.is_empty() {
            input.extend_from_slice(salt.as_bytes());
            input.push(b'$');
        }
        input.extend_from_slice(user_id);
        digest(&input)
    }
}

fn digest_hex<D: Digest>(input: &[u8]) -> String {
    hex::encode(D::digest(input))
}

/// Credentials for Vault's app-id auth backend.
///
/// Method and hash names are kept as configured and only checked when a token
/// is requested, so a bad value surfaces as an unseal error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppIdUnsealer {
    pub app_id: String,
    /// "mac" or "file".
    pub user_id_method: String,
    #[serde(default)]
    pub user_id_interface: String,
    #[serde(default)]
    pub user_id_path: String,
    /// "", "md5", "sha1" or "sha256".
    #[serde(default)]
    pub user_id_hash: String,
    #[serde(default)]
    pub user_id_salt: String,
}

#[derive(Serialize)]
struct AppIdLogin<'a> {
    user_id: &'a str,
}

impl AppIdUnsealer {
    /// Log in with the derived user id.
    ///
    /// POST {base_url}/v1/auth/app-id/login/{app_id}
    pub async fn token(&self, vault: &VaultClient) -> Result<String> {
        let user_id = self.user_id().await?;
        let path = format!("/v1/auth/app-id/login/{}", self.app_id);
        debug!(app_id = %self.app_id, "Logging in to Vault with app-id");

        let request = vault.login_request(&path, &AppIdLogin { user_id: &user_id });
        Ok(execute_login(request).await?.client_token)
    }

    /// The user id exactly as it will be submitted: read, then salted and hashed.
    pub async fn user_id(&self) -> Result<String> {
        let raw = match UserIdMethod::parse(&self.user_id_method)? {
            UserIdMethod::Mac => interface_mac(&self.user_id_interface)?.into_bytes(),
            UserIdMethod::File => tokio::fs::read(&self.user_id_path).await?,
        };
        let hash = HashMethod::parse(&self.user_id_hash)?;
        Ok(hash.apply(&raw, &self.user_id_salt))
    }
}

/// Lowercase, colon separated hardware address of `name`.
fn interface_mac(name: &str) -> Result<String> {
    let mac = mac_address::mac_address_by_name(name)
        .map_err(io::Error::other)?
        .ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no such network interface: {}", name))
        })?;
    Ok(format_mac(&mac.bytes()))
}

/// Interfaces without a hardware address (loopback, tunnels) report all zeros;
/// those yield an empty user id.
fn format_mac(bytes: &[u8]) -> String {
    if bytes.iter().all(|b| *b == 0) {
        return String::new();
    }
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":")
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn file_unsealer(path: &str, hash: &str, salt: &str) -> AppIdUnsealer {
        AppIdUnsealer {
            app_id: "my-app".into(),
            user_id_method: "file".into(),
            user_id_path: path.into(),
            user_id_hash: hash.into(),
            user_id_salt: salt.into(),
            ..Default::default()
        }
    }

    #[test]
    fn hash_digests() {
        assert_eq!(
            HashMethod::Sha256.apply(b"u", "s"),
            "aa97e36bca8489e6e24764827d64b2626db966c5f286512d80576f51a718821a"
        );
        assert_eq!(
            HashMethod::Sha256.apply(b"u", ""),
            "0bfe935e70c321c7ca3afc75ce0d0ca2f98b5422e008bb31c00c6d7f1f1c0ad6"
        );
        assert_eq!(
            HashMethod::Sha1.apply(b"u", "s"),
            "d10922b7b3125346b6dc39d2dd7889d5203da5f9"
        );
        assert_eq!(HashMethod::Md5.apply(b"u", ""), "7b774effe4a349c6dd82ad4f4f21d34c");
        assert_eq!(HashMethod::None.apply(b"u", "s"), "u");
    }

    #[test]
    fn mac_formatting() {
        assert_eq!(format_mac(&[0x02, 0x42, 0xac, 0x11, 0x00, 0x0a]), "02:42:ac:11:00:0a");
        assert_eq!(format_mac(&[0; 6]), "");
    }

    #[test]
    fn parse_rejects_unknown_names() {
        assert!(matches!(UserIdMethod::parse("ip"), Err(Error::UnknownUserIdMethod(m)) if m == "ip"));
        assert!(matches!(HashMethod::parse("crc32"), Err(Error::UnknownHashMethod(_))));
        assert_eq!(HashMethod::parse("").unwrap(), HashMethod::None);
    }

    #[tokio::test]
    async fn file_user_id_is_used_verbatim() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "machine-42").unwrap();

        let unsealer = file_unsealer(file.path().to_str().unwrap(), "", "ignored");
        assert_eq!(unsealer.user_id().await.unwrap(), "machine-42\n");
    }

    #[tokio::test]
    async fn file_user_id_hashes_raw_bytes() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[0xff, 0xfe, b'u']).unwrap();
        let path = file.path().to_str().unwrap();

        let unsealer = file_unsealer(path, "sha256", "");
        assert_eq!(
            unsealer.user_id().await.unwrap(),
            "d65aced390c1620c9b3de2ab2cfeb46047b1b2d5bd7e6cb7c8e113ef31248021"
        );

        let salted = file_unsealer(path, "sha256", "s");
        assert_eq!(
            salted.user_id().await.unwrap(),
            "54ad51393e38edc98f64776b4ea412fe17538f1c03b153ac6bb1582daec9c07e"
        );
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let unsealer = file_unsealer("/nonexistent/gatekeeper/user-id", "", "");
        assert!(matches!(unsealer.user_id().await, Err(Error::Io(_))));
    }

    #[tokio::test]
    async fn missing_interface_is_io_error() {
        let unsealer = AppIdUnsealer {
            app_id: "my-app".into(),
            user_id_method: "mac".into(),
            user_id_interface: "gk-does-not-exist0".into(),
            ..Default::default()
        };
        match unsealer.user_id().await {
            Err(Error::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::NotFound),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn unknown_hash_checked_after_user_id() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "u").unwrap();

        let unsealer = file_unsealer(file.path().to_str().unwrap(), "whirlpool", "");
        assert!(matches!(unsealer.user_id().await, Err(Error::UnknownHashMethod(m)) if m == "whirlpool"));
    }

    #[tokio::test]
    async fn token_submits_salted_sha256_user_id() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "u").unwrap();

        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/auth/app-id/login/my-app")
            .match_body(Matcher::Json(json!({
                "user_id": "aa97e36bca8489e6e24764827d64b2626db966c5f286512d80576f51a718821a"
            })))
            .with_status(200)
            .with_body(r#"{"auth": {"client_token": "s.app", "lease_duration": 60, "ttl": 60}}"#)
            .create_async()
            .await;

        let vault = VaultClient::new(server.url()).unwrap();
        let unsealer = file_unsealer(file.path().to_str().unwrap(), "sha256", "s");
        assert_eq!(unsealer.token(&vault).await.unwrap(), "s.app");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unknown_user_id_method_makes_no_request() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let vault = VaultClient::new(server.url()).unwrap();
        let unsealer = AppIdUnsealer {
            app_id: "my-app".into(),
            user_id_method: "hostname".into(),
            ..Default::default()
        };
        assert!(matches!(unsealer.token(&vault).await, Err(Error::UnknownUserIdMethod(_))));
        mock.assert_async().await;
    }
}
