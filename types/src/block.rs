//! A block as far as the engine cares: a header plus its uncles.

use serde::{Deserialize, Serialize};

use crate::header::Header;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: Header,
    #[serde(default)]
    pub uncles: Vec<Header>,
}

impl Block {
    pub fn new(header: Header, uncles: Vec<Header>) -> Self {
        Self { header, uncles }
    }

    pub fn number(&self) -> u64 {
        self.header.number
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn uncles(&self) -> &[Header] {
        &self.uncles
    }
}
