use ring::digest::{Context, SHA256};

/// Raw SHA-256 over a byte slice, 32-byte output.
pub fn sha256_digest(data: &[u8]) -> Vec<u8> {
    let mut context = Context::new(&SHA256);
    context.update(data);
    let digest = context.finish();
    digest.as_ref().to_vec()
}
