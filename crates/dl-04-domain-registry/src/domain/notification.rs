//! # Insertion Notification Record
//!
//! Compact binary record broadcast after a transaction is admitted:
//!
//! ```text
//! | txid_len: u8 | domain_len: u8 | txid | domain_id | group_count: u8 | group ids |
//! ```
//!
//! Group ids are fixed-length and concatenated without separators.

use shared_types::{AssetGroupId, DomainId, Identifier, TransactionId, ID_LENGTH};

use super::errors::RegistryError;

/// Decoded insertion notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertedNotification {
    pub transaction_id: TransactionId,
    pub domain_id: DomainId,
    pub asset_group_ids: Vec<AssetGroupId>,
}

impl InsertedNotification {
    pub fn new(
        transaction_id: TransactionId,
        domain_id: DomainId,
        asset_group_ids: Vec<AssetGroupId>,
    ) -> Self {
        Self {
            transaction_id,
            domain_id,
            asset_group_ids,
        }
    }

    /// Encode the record. At most 255 groups fit the count byte; the rest
    /// are not announced.
    pub fn encode(&self) -> Vec<u8> {
        let groups = &self.asset_group_ids[..self.asset_group_ids.len().min(u8::MAX as usize)];
        let mut out = Vec::with_capacity(3 + ID_LENGTH * (2 + groups.len()));
        out.push(ID_LENGTH as u8);
        out.push(ID_LENGTH as u8);
        out.extend_from_slice(self.transaction_id.as_bytes());
        out.extend_from_slice(self.domain_id.as_bytes());
        out.push(groups.len() as u8);
        for group in groups {
            out.extend_from_slice(group.as_bytes());
        }
        out
    }
}

/// Parse a record produced by [`InsertedNotification::encode`].
pub fn decode_inserted_notification(payload: &[u8]) -> Result<InsertedNotification, RegistryError> {
    let mut reader = Reader { buf: payload };
    let txid_len = reader.byte("transaction id length")? as usize;
    let domain_len = reader.byte("domain id length")? as usize;
    let transaction_id = TransactionId::from_slice(reader.take(txid_len, "transaction id")?)
        .map_err(|e| RegistryError::MalformedNotification(e.to_string()))?;
    let domain_id = DomainId::from_slice(reader.take(domain_len, "domain id")?)
        .map_err(|e| RegistryError::MalformedNotification(e.to_string()))?;
    let count = reader.byte("group count")? as usize;

    let mut asset_group_ids = Vec::with_capacity(count);
    for _ in 0..count {
        let raw = reader.take(ID_LENGTH, "asset group id")?;
        asset_group_ids.push(
            AssetGroupId::from_slice(raw)
                .map_err(|e| RegistryError::MalformedNotification(e.to_string()))?,
        );
    }

    Ok(InsertedNotification {
        transaction_id,
        domain_id,
        asset_group_ids,
    })
}

struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    fn byte(&mut self, what: &str) -> Result<u8, RegistryError> {
        Ok(self.take(1, what)?[0])
    }

    fn take(&mut self, n: usize, what: &str) -> Result<&'a [u8], RegistryError> {
        if self.buf.len() < n {
            return Err(RegistryError::MalformedNotification(format!(
                "truncated {what}"
            )));
        }
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> InsertedNotification {
        InsertedNotification::new(
            TransactionId::new([7; 32]),
            DomainId::new([1; 32]),
            vec![AssetGroupId::new([2; 32]), AssetGroupId::new([3; 32])],
        )
    }

    #[test]
    fn test_layout() {
        let raw = sample().encode();
        assert_eq!(raw.len(), 3 + 32 * 4);
        assert_eq!(&raw[..2], &[32, 32]);
        assert_eq!(&raw[2..34], &[7; 32]);
        assert_eq!(raw[66], 2);
    }

    #[test]
    fn test_decode_inverts_encode() {
        assert_eq!(decode_inserted_notification(&sample().encode()).unwrap(), sample());
    }

    #[test]
    fn test_truncated_record_is_rejected() {
        let raw = sample().encode();
        assert!(matches!(
            decode_inserted_notification(&raw[..raw.len() - 1]),
            Err(RegistryError::MalformedNotification(_))
        ));
        assert!(decode_inserted_notification(&[]).is_err());
    }

    #[test]
    fn test_wrong_id_length_is_rejected() {
        let mut raw = sample().encode();
        raw[0] = 16;
        assert!(decode_inserted_notification(&raw).is_err());
    }
}
