use super::amount::Amount;
use crate::error::PaymentError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Flat surcharge added to delivered orders.
pub const DELIVERY_COST: Decimal = dec!(10.00);

#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: &'static str,
    pub title: &'static str,
    pub price: Decimal,
}

pub const PRODUCTS: &[Product] = &[
    Product {
        id: "leite",
        title: "Pudim de Leite",
        price: dec!(35.00),
    },
    Product {
        id: "morango",
        title: "Pudim de Morango",
        price: dec!(45.00),
    },
    Product {
        id: "chocolate",
        title: "Pudim de Chocolate",
        price: dec!(50.00),
    },
];

pub fn find_product(id: &str) -> Option<&'static Product> {
    PRODUCTS.iter().find(|p| p.id == id)
}

#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub product: &'static Product,
    pub qty: u32,
}

/// Cart contents; only used to compute the amount charged at checkout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `qty` units of a catalog product, merging with an existing line.
    pub fn add(&mut self, product_id: &str, qty: u32) -> Result<(), PaymentError> {
        if qty == 0 {
            return Err(PaymentError::ValidationError(format!(
                "Quantity for '{}' must be positive",
                product_id
            )));
        }
        let product = find_product(product_id).ok_or_else(|| {
            PaymentError::ValidationError(format!("Unknown product '{}'", product_id))
        })?;

        match self.lines.iter_mut().find(|l| l.product.id == product.id) {
            Some(line) => {
                line.qty = line.qty.checked_add(qty).ok_or_else(|| {
                    PaymentError::ValidationError(format!(
                        "Quantity for '{}' is too large",
                        product_id
                    ))
                })?;
            }
            None => self.lines.push(CartLine { product, qty }),
        }
        Ok(())
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn subtotal(&self) -> Decimal {
        self.lines
            .iter()
            .map(|l| l.product.price * Decimal::from(l.qty))
            .sum()
    }

    /// Total charged at checkout: subtotal plus the delivery surcharge when delivering.
    pub fn charge_total(&self, delivering: bool) -> Result<Amount, PaymentError> {
        let surcharge = if delivering { DELIVERY_COST } else { Decimal::ZERO };
        Amount::new(self.subtotal() + surcharge)
            .map_err(|_| PaymentError::ValidationError("Cart is empty".to_string()))
    }
}
