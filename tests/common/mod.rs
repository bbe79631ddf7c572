//! Synthetic module images for integration tests.

#![allow(dead_code)]

pub const PATTERN_BYTES: usize = 1024;

pub struct Sample {
    pub data: Vec<i8>,
    pub finetune: u8,
    pub volume: u8,
    pub loop_start_words: u16,
    pub loop_length_words: u16,
}

impl Sample {
    /// Constant-level looping sample, handy for amplitude checks.
    pub fn dc(level: i8, len: usize) -> Self {
        Self {
            data: vec![level; len],
            finetune: 0,
            volume: 64,
            loop_start_words: 0,
            loop_length_words: (len / 2) as u16,
        }
    }

    /// Rising ramp that plays once.
    pub fn ramp(len: usize) -> Self {
        Self {
            data: (0..len).map(|i| (i % 128) as i8).collect(),
            finetune: 0,
            volume: 64,
            loop_start_words: 0,
            loop_length_words: 1,
        }
    }
}

/// A 31-instrument, 4-channel module built in memory.
pub struct ModImage {
    pub name: &'static str,
    pub samples: Vec<Sample>,
    pub order: Vec<u8>,
    /// (pattern, row, channel, sample number, period, effect, param)
    pub notes: Vec<(usize, usize, usize, u8, u16, u8, u8)>,
}

impl ModImage {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            samples: Vec::new(),
            order: vec![0],
            notes: Vec::new(),
        }
    }

    pub fn note(mut self, pattern: usize, row: usize, channel: usize, sample: u8, period: u16) -> Self {
        self.notes.push((pattern, row, channel, sample, period, 0, 0));
        self
    }

    pub fn effect(mut self, pattern: usize, row: usize, channel: usize, effect: u8, param: u8) -> Self {
        self.notes.push((pattern, row, channel, 0, 0, effect, param));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut name = [0u8; 20];
        name[..self.name.len()].copy_from_slice(self.name.as_bytes());
        out.extend_from_slice(&name);

        for i in 0..31 {
            let mut record = [0u8; 30];
            if let Some(s) = self.samples.get(i) {
                record[..6].copy_from_slice(b"sample");
                record[22..24].copy_from_slice(&((s.data.len() / 2) as u16).to_be_bytes());
                record[24] = s.finetune;
                record[25] = s.volume;
                record[26..28].copy_from_slice(&s.loop_start_words.to_be_bytes());
                record[28..30].copy_from_slice(&s.loop_length_words.to_be_bytes());
            }
            out.extend_from_slice(&record);
        }

        let mut order = [0u8; 128];
        order[..self.order.len()].copy_from_slice(&self.order);
        out.push(self.order.len() as u8);
        out.push(127);
        out.extend_from_slice(&order);
        out.extend_from_slice(b"M.K.");

        let pattern_count = *order.iter().max().unwrap_or(&0) as usize + 1;
        let mut patterns = vec![0u8; pattern_count * PATTERN_BYTES];
        for &(pat, row, ch, sample, period, effect, param) in &self.notes {
            let offset = pat * PATTERN_BYTES + (row * 4 + ch) * 4;
            let cell = &mut patterns[offset..offset + 4];
            if sample != 0 || period != 0 {
                cell[0] = (sample & 0xF0) | ((period >> 8) as u8 & 0x0F);
                cell[1] = period as u8;
                cell[2] = (sample << 4) | (cell[2] & 0x0F);
            }
            if effect != 0 || param != 0 {
                cell[2] = (cell[2] & 0xF0) | (effect & 0x0F);
                cell[3] = param;
            }
        }
        out.extend_from_slice(&patterns);

        for s in &self.samples {
            out.extend(s.data.iter().map(|&v| v as u8));
        }
        out
    }
}
