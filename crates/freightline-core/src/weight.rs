//! Chargeable-weight normalization: actual vs. volumetric weight and
//! carrier weight-step rounding. Pure functions, no side effects.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::{FreightError, Result};

const GRAMS_PER_KG: Decimal = dec!(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedWeight {
    pub actual_kg: Decimal,
    pub volume_kg: Decimal,
    pub chargeable_kg: Decimal,
}

/// Compute actual, volumetric and chargeable weight for a package.
///
/// The divisor is carrier-specific and expressed so that
/// `length * width * height / divisor` yields kilograms directly
/// (e.g. 5000 for the common cm³ convention). Chargeable weight is the
/// greater of actual and volumetric weight.
pub fn normalize(
    weight_g: Decimal,
    length_cm: Decimal,
    width_cm: Decimal,
    height_cm: Decimal,
    divisor: Decimal,
) -> Result<NormalizedWeight> {
    if weight_g <= Decimal::ZERO {
        return Err(FreightError::Validation(format!(
            "weight_g must be positive, got {weight_g}"
        )));
    }
    for (name, value) in [
        ("length_cm", length_cm),
        ("width_cm", width_cm),
        ("height_cm", height_cm),
    ] {
        if value <= Decimal::ZERO {
            return Err(FreightError::Validation(format!(
                "{name} must be positive, got {value}"
            )));
        }
    }
    if divisor <= Decimal::ZERO {
        return Err(FreightError::Internal(format!(
            "volumetric divisor must be positive, got {divisor}"
        )));
    }

    let actual_kg = weight_g / GRAMS_PER_KG;
    let volume_kg = length_cm * width_cm * height_cm / divisor;
    Ok(NormalizedWeight {
        actual_kg,
        volume_kg,
        chargeable_kg: actual_kg.max(volume_kg),
    })
}

/// Round a weight up to the smallest multiple of `step_kg` that is greater
/// than or equal to it.
pub fn round_up_to_step(weight_kg: Decimal, step_kg: Decimal) -> Result<Decimal> {
    if step_kg <= Decimal::ZERO {
        return Err(FreightError::Internal(format!(
            "weight step must be positive, got {step_kg}"
        )));
    }
    Ok((weight_kg / step_kg).ceil() * step_kg)
}
