//! Frame checksum
//!
//! Two 8-bit running sums (CK_A, CK_B) over class, id, length and payload:
//! every byte is added into CK_A, then CK_A is added into CK_B.

/// Running two-accumulator checksum
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Checksum {
    ck_a: u8,
    ck_b: u8,
}

impl Checksum {
    /// Fresh checksum, both accumulators at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Add bytes to the running sums
    pub fn update(&mut self, data: &[u8]) {
        for &byte in data {
            self.ck_a = self.ck_a.wrapping_add(byte);
            self.ck_b = self.ck_b.wrapping_add(self.ck_a);
        }
    }

    /// Current `[CK_A, CK_B]`
    pub fn finish(&self) -> [u8; 2] {
        [self.ck_a, self.ck_b]
    }
}

/// Checksum of a frame body (class through last payload byte)
pub fn calculate(body: &[u8]) -> [u8; 2] {
    let mut ck = Checksum::new();
    ck.update(body);
    ck.finish()
}

/// Verify a frame body against its trailing checksum bytes
pub fn verify(body: &[u8], expected: [u8; 2]) -> bool {
    calculate(body) == expected
}
