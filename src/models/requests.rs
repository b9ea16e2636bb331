use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::domain::{NewOrder, NewOrderItem, OrderStatus};

const PHONE_NUMBER: &str =
    r"^(\+7|7|8)?[\s\-]?\(?[489][0-9]{2}\)?[\s\-]?[0-9]{3}[\s\-]?[0-9]{2}[\s\-]?[0-9]{2}$";

/// Request to register a new order
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterOrderRequest {
    #[validate(length(min = 1, max = 50))]
    pub firstname: String,
    #[validate(length(max = 50))]
    #[serde(default)]
    pub lastname: String,
    #[validate(length(max = 200), custom(function = "validate_not_blank"))]
    pub address: String,
    #[validate(custom(function = "validate_phone_number"))]
    pub phonenumber: String,
    #[validate(length(min = 1, message = "products must be a non-empty list"), nested)]
    pub products: Vec<OrderProductPayload>,
}

/// A single `{product, quantity}` entry of an order request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderProductPayload {
    pub product: i64,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

impl RegisterOrderRequest {
    /// Convert into the store's input type, normalizing the phone number
    pub fn into_new_order(self) -> NewOrder {
        NewOrder {
            address: self.address.trim().to_string(),
            firstname: self.firstname,
            lastname: self.lastname,
            phonenumber: normalize_phone_number(&self.phonenumber),
            items: self
                .products
                .into_iter()
                .map(|p| NewOrderItem {
                    product_id: p.product,
                    quantity: p.quantity,
                })
                .collect(),
        }
    }

    /// Product ids that appear more than once in the request
    pub fn duplicate_products(&self) -> Vec<i64> {
        let mut seen = std::collections::BTreeSet::new();
        let mut duplicates = std::collections::BTreeSet::new();
        for p in &self.products {
            if !seen.insert(p.product) {
                duplicates.insert(p.product);
            }
        }
        duplicates.into_iter().collect()
    }
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new("blank"))
    } else {
        Ok(())
    }
}

fn validate_phone_number(value: &str) -> Result<(), ValidationError> {
    let pattern = Regex::new(PHONE_NUMBER).map_err(|_| ValidationError::new("phone_number_pattern"))?;
    if pattern.is_match(value.trim()) {
        Ok(())
    } else {
        Err(ValidationError::new("phone_number"))
    }
}

/// Normalize a Russian phone number to `+7XXXXXXXXXX`
///
/// Expects input that already passed `validate_phone_number`.
pub fn normalize_phone_number(value: &str) -> String {
    let digits: String = value.chars().filter(|c| c.is_ascii_digit()).collect();
    let national = match digits.len() {
        11 => &digits[1..],
        _ => digits.as_str(),
    };
    format!("+7{}", national)
}

/// Query parameters for listing orders awaiting dispatch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListOrdersQuery {
    #[serde(default)]
    pub status: Option<OrderStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(phone: &str, products: Vec<OrderProductPayload>) -> RegisterOrderRequest {
        RegisterOrderRequest {
            firstname: "Ivan".into(),
            lastname: "Petrov".into(),
            address: "Moscow, Tverskaya 1".into(),
            phonenumber: phone.into(),
            products,
        }
    }

    #[test]
    fn test_valid_request() {
        let req = request("+7 900 123-45-67", vec![OrderProductPayload { product: 1, quantity: 2 }]);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_empty_products_rejected() {
        let req = request("89001234567", vec![]);
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("products"));
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let req = request("89001234567", vec![OrderProductPayload { product: 1, quantity: 0 }]);
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_bad_phone_rejected() {
        let req = request("12345", vec![OrderProductPayload { product: 1, quantity: 1 }]);
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("phonenumber"));
    }

    #[test]
    fn test_blank_address_rejected() {
        for address in ["", "   ", "\t\n"] {
            let mut req = request("89001234567", vec![OrderProductPayload { product: 1, quantity: 1 }]);
            req.address = address.to_string();
            let errors = req.validate().unwrap_err();
            assert!(errors.field_errors().contains_key("address"), "address {:?}", address);
        }
    }

    #[test]
    fn test_address_trimmed() {
        let mut req = request("89001234567", vec![OrderProductPayload { product: 1, quantity: 1 }]);
        req.address = "  Tverskaya 1 ".to_string();
        assert!(req.validate().is_ok());
        assert_eq!(req.into_new_order().address, "Tverskaya 1");
    }

    #[test]
    fn test_normalize_phone_number() {
        assert_eq!(normalize_phone_number("8 (900) 123-45-67"), "+79001234567");
        assert_eq!(normalize_phone_number("+7 900 123 45 67"), "+79001234567");
        assert_eq!(normalize_phone_number("9001234567"), "+79001234567");
    }

    #[test]
    fn test_duplicate_products() {
        let req = request(
            "89001234567",
            vec![
                OrderProductPayload { product: 1, quantity: 1 },
                OrderProductPayload { product: 2, quantity: 1 },
                OrderProductPayload { product: 1, quantity: 3 },
            ],
        );
        assert_eq!(req.duplicate_products(), vec![1]);
    }
}
