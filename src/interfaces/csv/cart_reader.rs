use crate::domain::catalog::Cart;
use crate::error::{PaymentError, Result};
use serde::Deserialize;
use std::io::Read;

/// One `product,qty` row of a cart file.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct CartRow {
    pub product: String,
    pub qty: u32,
}

/// Reads a cart from a CSV source.
///
/// This reader wraps `csv::Reader` and handles whitespace trimming and
/// flexible record lengths automatically.
pub struct CartReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CartReader<R> {
    /// Creates a new `CartReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and deserializes cart rows.
    pub fn rows(self) -> impl Iterator<Item = Result<CartRow>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(PaymentError::from))
    }

    /// Builds a cart from every row; the first malformed row or unknown
    /// product aborts the read.
    pub fn into_cart(self) -> Result<Cart> {
        let mut cart = Cart::new();
        for row in self.rows() {
            let row = row?;
            cart.add(&row.product, row.qty)?;
        }
        Ok(cart)
    }
}
