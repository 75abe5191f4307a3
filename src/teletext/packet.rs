//! Teletext packet addressing (magazine/row/designation) decode.

use crate::utils::bits::unham_8_4;

/// A 44-byte VBI data unit decoded down to its magazine/row address
/// and 40-byte data payload (spec §9's typed-decoder note: this
/// replaces the C source's packed-struct overlay on a raw `u8*`).
#[derive(Debug, Clone, Copy)]
pub struct TeletextPacket {
    /// Magazine number, `1..=8` (an address field of `0` means `8`).
    pub magazine: u8,
    /// Row (`Y`) number, `0..=31`.
    pub row: u8,
    /// The 40-byte packet payload.
    pub data: [u8; 40],
}

impl TeletextPacket {
    /// Decodes the two Hamming(8,4)-protected address bytes and pairs
    /// them with the packet's data payload.
    pub fn decode(address: [u8; 2], data: [u8; 40]) -> Self {
        let (nib0, corrupt0) = unham_8_4(address[0]);
        let (nib1, corrupt1) = unham_8_4(address[1]);
        if corrupt0 || corrupt1 {
            log::debug!("Teletext packet address Hamming 8/4 failure");
        }
        let addr_byte = nib0 | (nib1 << 4);
        let magazine = match addr_byte & 0x07 {
            0 => 8,
            m => m,
        };
        let row = (addr_byte >> 3) & 0x1f;
        Self { magazine, row, data }
    }

    /// Designation code for extension packets (`Y > 25`): the Hamming
    /// 8/4 decode of `data[0]`.
    pub fn designation(&self) -> u8 {
        unham_8_4(self.data[0]).0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ham_8_4_encode(nibble: u8) -> u8 {
        let d1 = nibble & 1;
        let d2 = (nibble >> 1) & 1;
        let d3 = (nibble >> 2) & 1;
        let d4 = (nibble >> 3) & 1;
        let p1 = d1 ^ d2 ^ d4;
        let p2 = d1 ^ d3 ^ d4;
        let p3 = d2 ^ d3 ^ d4;
        let low7 = p1 | (p2 << 1) | (d1 << 2) | (p3 << 3) | (d2 << 4) | (d3 << 5) | (d4 << 6);
        let overall = (0..7u8).fold(0u8, |acc, n| acc ^ ((low7 >> n) & 1));
        low7 | (overall << 7)
    }

    #[test]
    fn decodes_magazine_and_row() {
        // address byte value 0x09 -> m = 1, y = 1
        let addr_byte = 0x09u8;
        let nib0 = addr_byte & 0x0f;
        let nib1 = (addr_byte >> 4) & 0x0f;
        let address = [ham_8_4_encode(nib0), ham_8_4_encode(nib1)];
        let packet = TeletextPacket::decode(address, [0u8; 40]);
        assert_eq!(packet.magazine, 1);
        assert_eq!(packet.row, 1);
    }

    #[test]
    fn magazine_zero_means_eight() {
        let addr_byte = 0x00u8; // m field = 0 -> magazine 8, row 0
        let address = [ham_8_4_encode(addr_byte & 0xf), ham_8_4_encode((addr_byte >> 4) & 0xf)];
        let packet = TeletextPacket::decode(address, [0u8; 40]);
        assert_eq!(packet.magazine, 8);
        assert_eq!(packet.row, 0);
    }
}
