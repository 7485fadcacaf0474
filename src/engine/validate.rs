use crate::limits::*;
use crate::model::*;

use super::EngineError;

pub(crate) fn validate_horizon(horizon: &Span) -> Result<(), EngineError> {
    if horizon.start >= horizon.end {
        return Err(EngineError::InvalidSpan(*horizon));
    }
    if horizon.duration_ms() > MAX_HORIZON_WIDTH_MS {
        return Err(EngineError::LimitExceeded("horizon too wide"));
    }
    Ok(())
}

pub(crate) fn validate_placements(
    potentials: &[Potentiality],
    materials: &[Material],
) -> Result<(), EngineError> {
    for potential in potentials {
        if potential.places.len() > MAX_PLACES_PER_POTENTIAL {
            return Err(EngineError::LimitExceeded("too many places in potentiality"));
        }
        if let Some(place) = potential.places.iter().find(|p| p.start >= p.end) {
            return Err(EngineError::InvalidSpan(*place));
        }
    }
    if let Some(material) = materials.iter().find(|m| m.start >= m.end) {
        return Err(EngineError::InvalidSpan(material.span()));
    }
    Ok(())
}

pub(crate) fn validate_quantities<'a>(
    transformations: impl IntoIterator<Item = &'a Transformation>,
) -> Result<(), EngineError> {
    for transformation in transformations {
        let too_many = transformation
            .needs
            .iter()
            .map(|n| n.quantity)
            .chain(transformation.inserts.iter().map(|i| i.quantity))
            .any(|q| q > MAX_TRANSFORM_QUANTITY);
        if too_many {
            return Err(EngineError::LimitExceeded("transform quantity too large"));
        }
    }
    Ok(())
}
