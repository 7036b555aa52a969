//! Legacy wire-format transaction assembly.
//!
//! A message is: 3-byte privilege header, compact array of unique account
//! keys (fee payer first, then writable signers, readonly signers, writable
//! non-signers, readonly non-signers), the recent blockhash, and the
//! instructions compiled down to account indices. Signatures are ed25519
//! over the serialized message, in account-key order.

use crate::wallet::Keypair;
use flip_core::{FlipError, Instruction, Pubkey, Result};

/// Compact-u16 length prefix: 7 bits per byte, little-endian groups, high
/// bit marks continuation.
pub fn encode_compact_u16(mut value: u16, out: &mut Vec<u8>) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if value == 0 {
            break;
        }
    }
}

#[derive(Debug, Clone)]
struct AccountEntry {
    pubkey: Pubkey,
    is_signer: bool,
    is_writable: bool,
}

/// A compiled message plus the signer set it requires, in signing order.
pub struct Message {
    pub bytes: Vec<u8>,
    pub signer_order: Vec<Pubkey>,
}

pub fn compile_message(
    instructions: &[&Instruction],
    payer: &Pubkey,
    recent_blockhash: &[u8; 32],
) -> Result<Message> {
    let mut entries: Vec<AccountEntry> = vec![AccountEntry {
        pubkey: *payer,
        is_signer: true,
        is_writable: true,
    }];

    let mut upsert = |pubkey: Pubkey, is_signer: bool, is_writable: bool| {
        match entries.iter_mut().find(|e| e.pubkey == pubkey) {
            Some(entry) => {
                entry.is_signer |= is_signer;
                entry.is_writable |= is_writable;
            }
            None => entries.push(AccountEntry {
                pubkey,
                is_signer,
                is_writable,
            }),
        }
    };

    for ix in instructions {
        for meta in &ix.accounts {
            upsert(meta.pubkey, meta.is_signer, meta.is_writable);
        }
        upsert(ix.program_id, false, false);
    }

    // stable privilege ordering; the payer stays at index 0
    let mut ordered: Vec<AccountEntry> = Vec::with_capacity(entries.len());
    for (want_signer, want_writable) in [(true, true), (true, false), (false, true), (false, false)]
    {
        ordered.extend(
            entries
                .iter()
                .filter(|e| e.is_signer == want_signer && e.is_writable == want_writable)
                .cloned(),
        );
    }

    let num_signers = ordered.iter().filter(|e| e.is_signer).count() as u8;
    let num_readonly_signed = ordered
        .iter()
        .filter(|e| e.is_signer && !e.is_writable)
        .count() as u8;
    let num_readonly_unsigned = ordered
        .iter()
        .filter(|e| !e.is_signer && !e.is_writable)
        .count() as u8;

    let index_of = |pubkey: &Pubkey| -> Result<u8> {
        ordered
            .iter()
            .position(|e| e.pubkey == *pubkey)
            .map(|i| i as u8)
            .ok_or_else(|| FlipError::internal("account vanished during message compilation"))
    };

    let mut bytes = vec![num_signers, num_readonly_signed, num_readonly_unsigned];
    encode_compact_u16(ordered.len() as u16, &mut bytes);
    for entry in &ordered {
        bytes.extend_from_slice(entry.pubkey.as_ref());
    }
    bytes.extend_from_slice(recent_blockhash);

    encode_compact_u16(instructions.len() as u16, &mut bytes);
    for ix in instructions {
        bytes.push(index_of(&ix.program_id)?);
        encode_compact_u16(ix.accounts.len() as u16, &mut bytes);
        for meta in &ix.accounts {
            bytes.push(index_of(&meta.pubkey)?);
        }
        encode_compact_u16(ix.data.len() as u16, &mut bytes);
        bytes.extend_from_slice(&ix.data);
    }

    let signer_order = ordered
        .iter()
        .filter(|e| e.is_signer)
        .map(|e| e.pubkey)
        .collect();

    Ok(Message {
        bytes,
        signer_order,
    })
}

/// Sign the message with every required keypair and emit the full wire
/// transaction.
pub fn sign_transaction(message: &Message, keypairs: &[&Keypair]) -> Result<Vec<u8>> {
    let mut signatures = Vec::with_capacity(message.signer_order.len());
    for required in &message.signer_order {
        let keypair = keypairs
            .iter()
            .find(|kp| kp.pubkey() == *required)
            .ok_or_else(|| FlipError::config(format!("no key material for signer {required}")))?;
        signatures.push(keypair.sign(&message.bytes));
    }

    let mut wire = Vec::with_capacity(1 + signatures.len() * 64 + message.bytes.len());
    encode_compact_u16(signatures.len() as u16, &mut wire);
    for signature in &signatures {
        wire.extend_from_slice(signature);
    }
    wire.extend_from_slice(&message.bytes);
    Ok(wire)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::SigningKey;
    use flip_core::AccountMeta;
    use rand::RngCore;

    fn compact(value: u16) -> Vec<u8> {
        let mut out = Vec::new();
        encode_compact_u16(value, &mut out);
        out
    }

    fn keypair() -> Keypair {
        let mut seed = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut seed);
        Keypair::from_bytes(&SigningKey::from_bytes(&seed).to_keypair_bytes()).unwrap()
    }

    #[test]
    fn test_compact_u16_vectors() {
        assert_eq!(compact(0), vec![0x00]);
        assert_eq!(compact(1), vec![0x01]);
        assert_eq!(compact(127), vec![0x7F]);
        assert_eq!(compact(128), vec![0x80, 0x01]);
        assert_eq!(compact(16383), vec![0xFF, 0x7F]);
        assert_eq!(compact(16384), vec![0x80, 0x80, 0x01]);
    }

    #[test]
    fn test_message_header_and_ordering() {
        let payer = Pubkey::new_rand();
        let extra_signer = Pubkey::new_rand();
        let writable = Pubkey::new_rand();
        let readonly = Pubkey::new_rand();
        let program = Pubkey::new_rand();

        let ix = Instruction {
            program_id: program,
            accounts: vec![
                AccountMeta::readonly_signer(extra_signer),
                AccountMeta::writable(writable),
                AccountMeta::readonly(readonly),
            ],
            data: vec![1, 2, 3],
        };

        let blockhash = [9u8; 32];
        let message = compile_message(&[&ix], &payer, &blockhash).unwrap();

        // 2 signers, 1 readonly signer, 2 readonly unsigned (readonly + program)
        assert_eq!(&message.bytes[..3], &[2, 1, 2]);
        assert_eq!(message.bytes[3], 5); // account count, compact
        assert_eq!(&message.bytes[4..36], payer.as_ref());
        assert_eq!(&message.bytes[36..68], extra_signer.as_ref());
        assert_eq!(&message.bytes[68..100], writable.as_ref());
        assert_eq!(message.signer_order, vec![payer, extra_signer]);

        // blockhash follows the five keys
        let hash_start = 4 + 5 * 32;
        assert_eq!(&message.bytes[hash_start..hash_start + 32], &blockhash);
    }

    #[test]
    fn test_privilege_merge_on_duplicate_account() {
        let payer = Pubkey::new_rand();
        let shared = Pubkey::new_rand();
        let program = Pubkey::new_rand();

        let first = Instruction {
            program_id: program,
            accounts: vec![AccountMeta::readonly(shared)],
            data: vec![],
        };
        let second = Instruction {
            program_id: program,
            accounts: vec![AccountMeta::writable(shared)],
            data: vec![],
        };

        let message = compile_message(&[&first, &second], &payer, &[0u8; 32]).unwrap();
        // payer + shared + program; shared promoted to writable
        assert_eq!(&message.bytes[..3], &[1, 0, 1]);
        assert_eq!(message.bytes[3], 3);
        assert_eq!(&message.bytes[36..68], shared.as_ref());
    }

    #[test]
    fn test_payer_dedup_with_instruction_signer() {
        let payer_kp = keypair();
        let payer = payer_kp.pubkey();
        let program = Pubkey::new_rand();
        let ix = Instruction {
            program_id: program,
            accounts: vec![AccountMeta::signer(payer)],
            data: vec![0xAA],
        };

        let message = compile_message(&[&ix], &payer, &[1u8; 32]).unwrap();
        assert_eq!(message.signer_order, vec![payer]);
        assert_eq!(&message.bytes[..3], &[1, 0, 1]);

        let wire = sign_transaction(&message, &[&payer_kp]).unwrap();
        assert_eq!(wire[0], 1); // one signature
        assert_eq!(wire.len(), 1 + 64 + message.bytes.len());
        assert_eq!(&wire[65..], &message.bytes[..]);
    }

    #[test]
    fn test_missing_signer_key_material() {
        let payer = Pubkey::new_rand();
        let program = Pubkey::new_rand();
        let ix = Instruction {
            program_id: program,
            accounts: vec![],
            data: vec![],
        };
        let message = compile_message(&[&ix], &payer, &[0u8; 32]).unwrap();
        let other = keypair();
        assert!(matches!(
            sign_transaction(&message, &[&other]),
            Err(FlipError::Config(_))
        ));
    }
}
