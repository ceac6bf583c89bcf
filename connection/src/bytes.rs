use std::io::{BufRead, Cursor, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use openssl::rsa::{Padding, Rsa};
use sha1::Sha1;
use sha2::{Digest, Sha256};

use common::err::decode_error::ReError;
use common::err::CResult;

use crate::declar::auth_plugin_names::AuthPlugin;
use crate::NULL_TERMINATOR;

/// Length of the scramble used by the password hashes.
pub const SCRAMBLE_LENGTH: usize = 20;

/// parse len encoded int, is PackedLong, return (used_bytes, value).
///
/// if first byte is less than 0xFB - Integer value is this 1 byte integer
/// 0xFB - NULL value, returned as 0
/// 0xFC - Integer value is encoded in the next 2 bytes (3 bytes total)
/// 0xFD - Integer value is encoded in the next 3 bytes (4 bytes total)
/// 0xFE - Integer value is encoded in the next 8 bytes (9 bytes total)
///
/// ref: https://dev.mysql.com/doc/internals/en/integer.html#packet-Protocol::LengthEncodedInteger
pub fn read_len_enc_num(cursor: &mut Cursor<&[u8]>) -> CResult<(usize, u64)> {
    let first_byte = cursor.read_u8()?;

    match first_byte {
        0..=0xFA => Ok((1, first_byte as u64)),
        0xFB => Ok((1, 0)),
        0xFC => Ok((3, cursor.read_u16::<LittleEndian>()? as u64)),
        0xFD => Ok((4, cursor.read_u24::<LittleEndian>()? as u64)),
        0xFE => Ok((9, cursor.read_u64::<LittleEndian>()?)),
        _ => Err(ReError::ProtocolError(format!(
            "Invalid length encoded integer prefix: {:#x}",
            first_byte
        ))),
    }
}

/// Length encoded bytes, `None` for the 0xFB NULL marker.
pub fn read_len_enc_bytes(cursor: &mut Cursor<&[u8]>) -> CResult<Option<Vec<u8>>> {
    let position = cursor.position() as usize;
    if cursor.get_ref().get(position) == Some(&0xFB) {
        cursor.set_position(position as u64 + 1);
        return Ok(None);
    }

    let (_, len) = read_len_enc_num(cursor)?;
    let remaining = cursor.get_ref().len() - cursor.position() as usize;
    if len as usize > remaining {
        return Err(ReError::malformed_packet());
    }
    let mut value = vec![0u8; len as usize];
    cursor.read_exact(&mut value)?;
    Ok(Some(value))
}

pub fn read_len_enc_str(cursor: &mut Cursor<&[u8]>) -> CResult<String> {
    let value = read_len_enc_bytes(cursor)?.unwrap_or_default();
    Ok(String::from_utf8(value)?)
}

pub fn read_null_term_bytes(cursor: &mut Cursor<&[u8]>) -> CResult<Vec<u8>> {
    let mut value = Vec::new();
    cursor.read_until(NULL_TERMINATOR, &mut value)?;
    if value.last() == Some(&NULL_TERMINATOR) {
        value.pop();
    }
    Ok(value)
}

pub fn read_null_term_string(cursor: &mut Cursor<&[u8]>) -> CResult<String> {
    Ok(String::from_utf8(read_null_term_bytes(cursor)?)?)
}

pub fn write_len_enc_num<W: Write>(writer: &mut W, value: u64) -> CResult<()> {
    if value < 0xFB {
        writer.write_u8(value as u8)?;
    } else if value <= 0xFFFF {
        writer.write_u8(0xFC)?;
        writer.write_u16::<LittleEndian>(value as u16)?;
    } else if value <= 0xFF_FFFF {
        writer.write_u8(0xFD)?;
        writer.write_u24::<LittleEndian>(value as u32)?;
    } else {
        writer.write_u8(0xFE)?;
        writer.write_u64::<LittleEndian>(value)?;
    }
    Ok(())
}

pub fn write_len_enc_bytes<W: Write>(writer: &mut W, value: &[u8]) -> CResult<()> {
    write_len_enc_num(writer, value.len() as u64)?;
    writer.write_all(value)?;
    Ok(())
}

pub fn write_null_term_string<W: Write>(writer: &mut W, str: &str) -> CResult<()> {
    writer.write_all(str.as_bytes())?;
    writer.write_u8(NULL_TERMINATOR)?;
    Ok(())
}

/// Auth response for the plugins that answer the greeting directly.
pub fn encrypt_password(password: &str, scramble: &[u8], auth_plugin: &AuthPlugin) -> Vec<u8> {
    match auth_plugin {
        AuthPlugin::MySqlNativePassword => scramble_native_password(scramble, password),
        AuthPlugin::CachingSha2Password => scramble_caching_sha2(scramble, password),
        AuthPlugin::MySqlClearPassword => {
            let mut value = password.as_bytes().to_vec();
            value.push(NULL_TERMINATOR);
            value
        }
        AuthPlugin::Sha256Password => {
            if password.is_empty() {
                // 空密码只发送一个0
                vec![NULL_TERMINATOR]
            } else {
                // 向服务端请求公钥
                vec![0x01]
            }
        }
    }
}

/// SHA1(password) XOR SHA1(scramble + SHA1(SHA1(password)))
pub fn scramble_native_password(scramble: &[u8], password: &str) -> Vec<u8> {
    if password.is_empty() {
        return Vec::new();
    }
    let scramble = &scramble[..scramble.len().min(SCRAMBLE_LENGTH)];

    let password_hash = sha1(password.as_bytes());
    let concat_hash = [scramble, sha1(&password_hash).as_slice()].concat();
    xor(&password_hash, &sha1(&concat_hash))
}

/// SHA256(password) XOR SHA256(SHA256(SHA256(password)) + scramble)
pub fn scramble_caching_sha2(scramble: &[u8], password: &str) -> Vec<u8> {
    if password.is_empty() {
        return Vec::new();
    }
    let scramble = &scramble[..scramble.len().min(SCRAMBLE_LENGTH)];

    let password_hash = sha256(password.as_bytes());
    let concat_hash = [sha256(&password_hash).as_slice(), scramble].concat();
    xor(&password_hash, &sha256(&concat_hash))
}

/// RSA-OAEP encrypts `(password + NUL) XOR scramble` with the server public key.
pub fn encrypt_password_rsa(password: &str, scramble: &[u8], public_key: &[u8]) -> CResult<Vec<u8>> {
    let mut plain = password.as_bytes().to_vec();
    plain.push(NULL_TERMINATOR);
    let plain = xor(&plain, scramble);

    let rsa = Rsa::public_key_from_pem(public_key)
        .or_else(|_| Rsa::public_key_from_pem_pkcs1(public_key))
        .map_err(|e| ReError::AuthenticationError(format!("Can not load server public key: {}", e)))?;

    let mut encrypted = vec![0u8; rsa.size() as usize];
    let len = rsa
        .public_encrypt(&plain, &mut encrypted, Padding::PKCS1_OAEP)
        .map_err(|e| ReError::AuthenticationError(format!("Can not encrypt password: {}", e)))?;
    encrypted.truncate(len);
    Ok(encrypted)
}

/// `slice1` XOR `slice2`, cycling `slice2` when it is shorter.
pub fn xor(slice1: &[u8], slice2: &[u8]) -> Vec<u8> {
    if slice2.is_empty() {
        return slice1.to_vec();
    }
    slice1
        .iter()
        .enumerate()
        .map(|(i, b)| b ^ slice2[i % slice2.len()])
        .collect()
}

pub fn sha1(value: &[u8]) -> Vec<u8> {
    let mut hasher = Sha1::new();
    hasher.update(value);
    hasher.finalize().as_slice().to_vec()
}

pub fn sha256(value: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(value);
    hasher.finalize().as_slice().to_vec()
}
