use crate::utils::error::{Result, SimError};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(SimError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(SimError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// 檢查 `[low, high)` 區間不為空
pub fn validate_half_open_interval(field_name: &str, low: u64, high: u64) -> Result<()> {
    if low >= high {
        return Err(SimError::ConfigValidationError {
            field: field_name.to_string(),
            message: format!("Lower bound {} must be below upper bound {}", low, high),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("world.port_count", 4, 1).is_ok());
        assert!(validate_positive_number("world.port_count", 0, 1).is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("tunnel.capacity", 5u64, 1, 64).is_ok());
        assert!(validate_range("tunnel.capacity", 65u64, 1, 64).is_err());
    }

    #[test]
    fn test_validate_half_open_interval() {
        assert!(validate_half_open_interval("timing.tunnel_delay", 2000, 10000).is_ok());
        assert!(validate_half_open_interval("timing.tunnel_delay", 10, 10).is_err());
    }
}
