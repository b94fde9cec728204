// Password-based encryption for the hidden message.
// Key = PBKDF2-HMAC-SHA256(password, salt, iterations); cipher = AES-256-CBC
// over PKCS#7-padded plaintext. Salt and IV are fresh per call.

use aes::Aes256;
use cbc::cipher::generic_array::GenericArray;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use subtle::{Choice, ConstantTimeEq, ConstantTimeGreater, ConstantTimeLess};
use zeroize::Zeroizing;

use crate::error::{Result, StegoError};

pub const SALT_LEN: usize = 16;
pub const IV_LEN: usize = 16;
pub const KEY_LEN: usize = 32;
pub const BLOCK_LEN: usize = 16;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Everything a frame carries: salt and IV in the clear, plus the ciphertext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    pub salt: [u8; SALT_LEN],
    pub iv: [u8; IV_LEN],
    pub ciphertext: Vec<u8>,
}

/// Stretch `password` into a 256-bit AES key. Deterministic in all three inputs.
pub fn derive_key(password: &[u8], salt: &[u8], iterations: u32) -> Zeroizing<[u8; KEY_LEN]> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut key[..]);
    key
}

/// Encrypt `plaintext` under a key derived from `password`.
///
/// The returned ciphertext is always `16 * (len / 16 + 1)` bytes: a full
/// block of padding is appended when the input is already block-aligned.
pub fn encrypt(plaintext: &[u8], password: &[u8], iterations: u32) -> Sealed {
    let mut rng = rand::thread_rng();
    let mut salt = [0u8; SALT_LEN];
    let mut iv = [0u8; IV_LEN];
    rng.fill_bytes(&mut salt);
    rng.fill_bytes(&mut iv);

    let key = derive_key(password, &salt, iterations);
    let mut ciphertext = pad(plaintext);
    cbc_encrypt_blocks(&key, &iv, &mut ciphertext);
    Sealed { salt, iv, ciphertext }
}

/// Decrypt and strip padding. A wrong password almost always ends in
/// [`StegoError::InvalidPadding`]; the bytes are not checked for UTF-8 here.
pub fn decrypt(
    salt: &[u8; SALT_LEN],
    iv: &[u8; IV_LEN],
    ciphertext: &[u8],
    password: &[u8],
    iterations: u32,
) -> Result<Vec<u8>> {
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_LEN != 0 {
        return Err(StegoError::MalformedCiphertext(ciphertext.len()));
    }
    let key = derive_key(password, salt, iterations);
    let mut padded = Zeroizing::new(ciphertext.to_vec());
    cbc_decrypt_blocks(&key, iv, &mut padded);
    Ok(unpad(&padded)?.to_vec())
}

impl Sealed {
    pub fn open(&self, password: &[u8], iterations: u32) -> Result<Vec<u8>> {
        decrypt(&self.salt, &self.iv, &self.ciphertext, password, iterations)
    }
}

/// Optional text step after [`decrypt`].
pub fn decode_text(plaintext: Vec<u8>) -> Result<String> {
    Ok(String::from_utf8(plaintext)?)
}

fn pad(plaintext: &[u8]) -> Vec<u8> {
    let pad_len = BLOCK_LEN - plaintext.len() % BLOCK_LEN;
    let mut padded = Vec::with_capacity(plaintext.len() + pad_len);
    padded.extend_from_slice(plaintext);
    padded.resize(plaintext.len() + pad_len, pad_len as u8);
    padded
}

/// Both checks always run over the whole final block; no early exit.
fn unpad(padded: &[u8]) -> Result<&[u8]> {
    let len = padded.len();
    let pad_len = padded[len - 1];

    let mut valid: Choice = pad_len.ct_gt(&0) & !pad_len.ct_gt(&(BLOCK_LEN as u8));
    for (i, byte) in padded[len - BLOCK_LEN..].iter().rev().enumerate() {
        let covered = (i as u8).ct_lt(&pad_len);
        valid &= !covered | byte.ct_eq(&pad_len);
    }

    if bool::from(valid) {
        Ok(&padded[..len - pad_len as usize])
    } else {
        Err(StegoError::InvalidPadding)
    }
}

// `buf` must be a whole number of blocks.
fn cbc_encrypt_blocks(key: &[u8; KEY_LEN], iv: &[u8; IV_LEN], buf: &mut [u8]) {
    let mut cipher = Aes256CbcEnc::new(GenericArray::from_slice(key), GenericArray::from_slice(iv));
    for block in buf.chunks_exact_mut(BLOCK_LEN) {
        cipher.encrypt_block_mut(GenericArray::from_mut_slice(block));
    }
}

fn cbc_decrypt_blocks(key: &[u8; KEY_LEN], iv: &[u8; IV_LEN], buf: &mut [u8]) {
    let mut cipher = Aes256CbcDec::new(GenericArray::from_slice(key), GenericArray::from_slice(iv));
    for block in buf.chunks_exact_mut(BLOCK_LEN) {
        cipher.decrypt_block_mut(GenericArray::from_mut_slice(block));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ITER: u32 = 1_000;

    fn expected_len(n: usize) -> usize {
        16 * ((n + 1 + 15) / 16)
    }

    #[test]
    fn roundtrip_various_lengths() {
        for n in [0usize, 1, 15, 16, 17, 31, 32, 33, 1000] {
            let msg: Vec<u8> = (0..n).map(|i| (i * 7 + 3) as u8).collect();
            let sealed = encrypt(&msg, b"pw", ITER);
            assert_eq!(sealed.ciphertext.len(), expected_len(n), "len {n}");
            assert_eq!(sealed.open(b"pw", ITER).unwrap(), msg, "len {n}");
        }
    }

    #[test]
    fn roundtrip_raw_non_utf8_bytes() {
        let msg = [0xffu8, 0xfe, 0x00, 0x80, 0x10, 0x10];
        let sealed = encrypt(&msg, b"\x00\xffbinary pw", ITER);
        assert_eq!(sealed.open(b"\x00\xffbinary pw", ITER).unwrap(), msg);
    }

    #[test]
    fn concrete_lengths() {
        assert_eq!(encrypt(b"Hello", b"pw123", ITER).ciphertext.len(), 16);
        assert_eq!(encrypt(b"", b"pw", ITER).ciphertext.len(), 16);
        assert_eq!(encrypt(b"0123456789ABCDEF", b"pw", ITER).ciphertext.len(), 32);
    }

    #[test]
    fn default_iterations_roundtrip() {
        let sealed = encrypt(b"Hello", b"pw123", crate::config::DEFAULT_ITERATIONS);
        let plain = sealed.open(b"pw123", crate::config::DEFAULT_ITERATIONS).unwrap();
        assert_eq!(decode_text(plain).unwrap(), "Hello");
    }

    #[test]
    fn salt_and_iv_are_fresh() {
        let a = encrypt(b"same", b"pw", ITER);
        let b = encrypt(b"same", b"pw", ITER);
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.iv, b.iv);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn wrong_password_never_yields_message() {
        let msg = b"Wrong password test";
        for wrong in [&b"WrongPass"[..], b"correctpass", b"", b"CorrectPass "] {
            let sealed = encrypt(msg, b"CorrectPass", ITER);
            match sealed.open(wrong, ITER) {
                Ok(plain) => assert_ne!(plain, msg),
                Err(e) => assert!(matches!(e, StegoError::InvalidPadding), "{e}"),
            }
        }
    }

    #[test]
    fn wrong_iterations_never_yields_message() {
        let sealed = encrypt(b"iteration mismatch", b"pw", ITER);
        assert_ne!(sealed.open(b"pw", ITER + 1).ok().as_deref(), Some(&b"iteration mismatch"[..]));
    }

    #[test]
    fn malformed_ciphertext_lengths() {
        let salt = [0u8; SALT_LEN];
        let iv = [0u8; IV_LEN];
        for n in [0usize, 1, 15, 17, 33] {
            let err = decrypt(&salt, &iv, &vec![0u8; n], b"pw", ITER).unwrap_err();
            assert!(matches!(err, StegoError::MalformedCiphertext(m) if m == n));
        }
    }

    fn seal_raw_block(last_block: [u8; BLOCK_LEN]) -> Vec<u8> {
        let salt = [9u8; SALT_LEN];
        let iv = [3u8; IV_LEN];
        let key = derive_key(b"pw", &salt, ITER);
        let mut buf = last_block.to_vec();
        cbc_encrypt_blocks(&key, &iv, &mut buf);
        buf
    }

    fn open_raw(ciphertext: &[u8]) -> Result<Vec<u8>> {
        decrypt(&[9u8; SALT_LEN], &[3u8; IV_LEN], ciphertext, b"pw", ITER)
    }

    #[test]
    fn pad_value_zero_rejected() {
        let ct = seal_raw_block([0u8; BLOCK_LEN]);
        assert!(matches!(open_raw(&ct), Err(StegoError::InvalidPadding)));
    }

    #[test]
    fn pad_value_above_block_rejected() {
        let ct = seal_raw_block([17u8; BLOCK_LEN]);
        assert!(matches!(open_raw(&ct), Err(StegoError::InvalidPadding)));
    }

    #[test]
    fn pad_bytes_mismatch_rejected() {
        let mut block = [b'x'; BLOCK_LEN];
        block[12..].copy_from_slice(&[4, 4, 5, 4]);
        let ct = seal_raw_block(block);
        assert!(matches!(open_raw(&ct), Err(StegoError::InvalidPadding)));
    }

    #[test]
    fn full_padding_block_accepted() {
        let ct = seal_raw_block([16u8; BLOCK_LEN]);
        assert_eq!(open_raw(&ct).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn partial_padding_accepted() {
        let mut block = [b'a'; BLOCK_LEN];
        block[13..].copy_from_slice(&[3, 3, 3]);
        let ct = seal_raw_block(block);
        assert_eq!(open_raw(&ct).unwrap(), vec![b'a'; 13]);
    }

    #[test]
    fn derive_key_rfc_vector() {
        // PBKDF2-HMAC-SHA256, P = "password", S = "salt", c = 1, dkLen = 32
        let key = derive_key(b"password", b"salt", 1);
        assert_eq!(
            hex::encode(&key[..]),
            "120fb6cffcf8b32c43e7225256c4f837a86548c92ccc35480805987cb70be17b"
        );
    }

    #[test]
    fn derive_key_depends_on_inputs() {
        let salt = [1u8; SALT_LEN];
        let base = derive_key(b"pw", &salt, ITER);
        assert_eq!(*base, *derive_key(b"pw", &salt, ITER));
        assert_ne!(*base, *derive_key(b"pw2", &salt, ITER));
        assert_ne!(*base, *derive_key(b"pw", &[2u8; SALT_LEN], ITER));
        assert_ne!(*base, *derive_key(b"pw", &salt, ITER + 1));
    }

    #[test]
    fn aes256_cbc_nist_vector() {
        // SP 800-38A F.2.5, first block
        let key: [u8; KEY_LEN] =
            hex::decode("603deb1015ca71be2b73aef0857d77811f352c073b6108d72d9810a30914dff4")
                .unwrap()
                .try_into()
                .unwrap();
        let iv: [u8; IV_LEN] = hex::decode("000102030405060708090a0b0c0d0e0f")
            .unwrap()
            .try_into()
            .unwrap();
        let mut block = hex::decode("6bc1bee22e409f96e93d7e117393172a").unwrap();
        cbc_encrypt_blocks(&key, &iv, &mut block);
        assert_eq!(hex::encode(&block), "f58c4c04d6e5f1ba779eabfb5f7bfbd6");
        cbc_decrypt_blocks(&key, &iv, &mut block);
        assert_eq!(hex::encode(&block), "6bc1bee22e409f96e93d7e117393172a");
    }

    #[test]
    fn decode_text_rejects_invalid_utf8() {
        assert!(matches!(decode_text(vec![0xff, 0xfe]), Err(StegoError::InvalidEncoding(_))));
        assert_eq!(decode_text(b"ok".to_vec()).unwrap(), "ok");
    }
}
