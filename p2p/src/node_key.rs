use std::{fs, io::ErrorKind, path::Path};

use anyhow::Result;
use libp2p_identity::{secp256k1, Keypair};
use log::info;

/// Loads the node's secp256k1 key from `path`, or generates and persists a
/// fresh one if the file does not exist.
///
/// Existing files may hold either a hex-encoded 32-byte secret or the
/// length-prefixed binary keypair encoding; hex is tried first.
pub fn load_or_generate_node_key(path: &Path) -> Result<Keypair> {
    match fs::read(path) {
        Ok(bytes) => decode_node_key(&bytes),
        Err(error) if error.kind() == ErrorKind::NotFound => {
            let keypair = Keypair::generate_secp256k1();

            write_restricted(path, &keypair.to_protobuf_encoding()?)?;
            info!("generated new node key at {}", path.display());

            Ok(keypair)
        }
        Err(error) => Err(error.into()),
    }
}

fn decode_node_key(bytes: &[u8]) -> Result<Keypair> {
    if let Ok(mut secret_bytes) = hex::decode(String::from_utf8_lossy(bytes).trim()) {
        if secret_bytes.len() == 32 {
            let secret = secp256k1::SecretKey::try_from_bytes(&mut secret_bytes)?;
            return Ok(secp256k1::Keypair::from(secret).into());
        }
    }

    Ok(Keypair::from_protobuf_encoding(bytes)?)
}

#[cfg(unix)]
fn write_restricted(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    use std::{io::Write as _, os::unix::fs::OpenOptionsExt as _};

    fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)?
        .write_all(bytes)
}

#[cfg(not(unix))]
fn write_restricted(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    fs::write(path, bytes)
}
