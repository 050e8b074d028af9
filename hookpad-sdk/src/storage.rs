// ABOUTME: Secure session secret storage using system keychain
// ABOUTME: Persists the identity provider session with a keyring backend

#[cfg(feature = "keychain")]
use keyring::Entry;

#[cfg(feature = "keychain")]
const SERVICE: &str = "hookpad";
#[cfg(feature = "keychain")]
const ACCOUNT: &str = "session-secret";

#[cfg(feature = "keychain")]
pub fn store(secret: &str) -> anyhow::Result<()> {
    Entry::new(SERVICE, ACCOUNT)?.set_password(secret)?;
    Ok(())
}

#[cfg(feature = "keychain")]
pub fn load() -> anyhow::Result<String> {
    Ok(Entry::new(SERVICE, ACCOUNT)?.get_password()?)
}

#[cfg(feature = "keychain")]
pub fn clear() -> anyhow::Result<()> {
    // delete_credential() errors when nothing is stored; ignore that
    let _ = Entry::new(SERVICE, ACCOUNT)?.delete_credential();
    Ok(())
}

#[cfg(not(feature = "keychain"))]
pub fn store(_secret: &str) -> anyhow::Result<()> {
    Err(anyhow::anyhow!("Keychain feature not enabled"))
}

#[cfg(not(feature = "keychain"))]
pub fn load() -> anyhow::Result<String> {
    Err(anyhow::anyhow!("Keychain feature not enabled"))
}

#[cfg(not(feature = "keychain"))]
pub fn clear() -> anyhow::Result<()> {
    Err(anyhow::anyhow!("Keychain feature not enabled"))
}
