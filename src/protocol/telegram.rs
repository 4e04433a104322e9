use std::fmt;

use serde::Serialize;

use crate::core::{Address, ChecksumMismatch, VariableCode, DOMAIN, POLL_COMMAND, TELEGRAM_LENGTH};
use crate::util::hex_bytes;

/// One fixed 6-byte bus message
///
/// Telegrams are value objects: they come out of [`encode`] or [`validate`] and
/// are never modified afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Telegram {
    domain: u8,
    sender: u8,
    receiver: u8,
    command: u8,
    value: u8,
    checksum: u8,
}

impl Telegram {
    /// Channel discriminator; 1 for application telegrams
    pub fn domain(&self) -> u8 {
        self.domain
    }

    pub fn sender(&self) -> Address {
        Address(self.sender)
    }

    pub fn receiver(&self) -> Address {
        Address(self.receiver)
    }

    /// Raw command byte: [`POLL_COMMAND`] or the variable being set/reported
    pub fn command(&self) -> u8 {
        self.command
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn checksum(&self) -> u8 {
        self.checksum
    }

    /// Whether this telegram belongs to the application domain
    pub fn is_application(&self) -> bool {
        self.domain == DOMAIN
    }

    /// Whether this is a poll request (command byte 0)
    pub fn is_poll(&self) -> bool {
        self.command == POLL_COMMAND
    }

    /// The variable this telegram is about: the polled code for a poll
    /// request, the command byte otherwise
    pub fn variable(&self) -> VariableCode {
        if self.is_poll() {
            VariableCode(self.value)
        } else {
            VariableCode(self.command)
        }
    }

    /// Wire representation
    pub fn to_bytes(&self) -> [u8; TELEGRAM_LENGTH] {
        [
            self.domain,
            self.sender,
            self.receiver,
            self.command,
            self.value,
            self.checksum,
        ]
    }
}

impl fmt::Display for Telegram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex_bytes(&self.to_bytes()))
    }
}

impl From<Telegram> for [u8; TELEGRAM_LENGTH] {
    fn from(telegram: Telegram) -> Self {
        telegram.to_bytes()
    }
}

/// Sum of the given bytes modulo 256
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// Builds an application telegram with a correct checksum
///
/// A `command` of [`POLL_COMMAND`] makes a poll request in which `value`
/// carries the variable code to poll.
pub fn encode(sender: Address, receiver: Address, command: u8, value: u8) -> Telegram {
    let head = [DOMAIN, sender.0, receiver.0, command, value];
    Telegram {
        domain: DOMAIN,
        sender: sender.0,
        receiver: receiver.0,
        command,
        value,
        checksum: checksum(&head),
    }
}

/// Accepts a 6-byte window whose last byte checksums the first five
///
/// The domain byte is not inspected.
pub fn validate(candidate: &[u8; TELEGRAM_LENGTH]) -> Result<Telegram, ChecksumMismatch> {
    let expected = checksum(&candidate[..TELEGRAM_LENGTH - 1]);
    let received = candidate[TELEGRAM_LENGTH - 1];
    if expected != received {
        return Err(ChecksumMismatch { expected, received });
    }

    Ok(Telegram {
        domain: candidate[0],
        sender: candidate[1],
        receiver: candidate[2],
        command: candidate[3],
        value: candidate[4],
        checksum: received,
    })
}

/// Set `variable` to `value` on the master, sent from `local`
pub fn build_set_command(local: Address, variable: VariableCode, value: u8) -> Telegram {
    encode(local, Address::MASTER, variable.0, value)
}

/// Ask the master for the current value of `variable`, sent from `local`
pub fn build_poll_request(local: Address, variable: VariableCode) -> Telegram {
    encode(local, Address::MASTER, POLL_COMMAND, variable.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::HashSet;

    #[test]
    fn test_known_poll_telegram() {
        // Panel1 polls Select from the master
        let telegram = build_poll_request(Address::PANEL1, VariableCode::SELECT);
        assert_eq!(telegram.to_bytes(), [0x01, 0x21, 0x11, 0x00, 0xA3, 0xD6]);
        assert!(telegram.is_poll());
        assert_eq!(telegram.variable(), VariableCode::SELECT);
        assert_eq!(telegram.to_string(), "01 21 11 00 A3 D6");
    }

    #[test]
    fn test_set_command() {
        let telegram = build_set_command(Address::PANEL2, VariableCode::FAN_SPEED, 0x07);
        assert_eq!(telegram.to_bytes(), [0x01, 0x22, 0x11, 0x29, 0x07, 0x64]);
        assert!(!telegram.is_poll());
        assert_eq!(telegram.variable(), VariableCode::FAN_SPEED);
        assert_eq!(telegram.sender(), Address::PANEL2);
        assert_eq!(telegram.receiver(), Address::MASTER);
    }

    #[test]
    fn test_checksum_wraps() {
        assert_eq!(checksum(&[0xFF, 0xFF, 0x02]), 0x00);
        assert_eq!(checksum(&[]), 0);
    }

    /// Every ordering of `items`, by Heap's algorithm
    fn permutations(items: [u8; 5]) -> Vec<[u8; 5]> {
        fn heap(k: usize, items: &mut [u8; 5], out: &mut Vec<[u8; 5]>) {
            if k == 1 {
                out.push(*items);
                return;
            }
            heap(k - 1, items, out);
            for i in 0..k - 1 {
                if k % 2 == 0 {
                    items.swap(i, k - 1);
                } else {
                    items.swap(0, k - 1);
                }
                heap(k - 1, items, out);
            }
        }

        let mut items = items;
        let mut out = Vec::new();
        heap(items.len(), &mut items, &mut out);
        out
    }

    #[test]
    fn test_checksum_is_order_blind() {
        let bytes = [0x01u8, 0x11, 0x20, 0x29, 0x07];
        let reference = checksum(&bytes);

        let all = permutations(bytes);
        let distinct: HashSet<[u8; 5]> = all.iter().copied().collect();
        assert_eq!(distinct.len(), 120);

        for permuted in &all {
            assert_eq!(checksum(permuted), reference);
        }
    }

    #[test]
    fn test_validate_round_trip() {
        let mut rng = StdRng::seed_from_u64(0x7e1e);
        let edges = [
            [0x11u8, 0x20, 0x32, 0x73],
            [0x22, 0x11, 0x00, 0xA3],
            [0xFF, 0xFF, 0xFF, 0xFF],
            [0x00, 0x00, 0x00, 0x00],
        ];
        let sampled = (0..2000).map(|_| rng.gen::<[u8; 4]>());

        for [sender, receiver, command, value] in edges.into_iter().chain(sampled) {
            let telegram = encode(Address(sender), Address(receiver), command, value);
            let decoded = validate(&telegram.to_bytes()).unwrap();
            assert_eq!(decoded, telegram);
            assert_eq!(decoded.domain(), DOMAIN);
            assert_eq!(decoded.sender(), Address(sender));
            assert_eq!(decoded.receiver(), Address(receiver));
            assert_eq!(decoded.command(), command);
            assert_eq!(decoded.value(), value);
        }
    }

    #[test]
    fn test_validate_mismatch() {
        let err = validate(&[0x01, 0x21, 0x11, 0x00, 0xA3, 0xC9]).unwrap_err();
        assert_eq!(err, ChecksumMismatch { expected: 0xD6, received: 0xC9 });
    }

    #[test]
    fn test_validate_ignores_domain() {
        let bytes = [0x02, 0x11, 0x20, 0x29, 0x07, 0x63];
        let telegram = validate(&bytes).unwrap();
        assert_eq!(telegram.domain(), 2);
        assert!(!telegram.is_application());
    }
}
