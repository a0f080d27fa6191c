use crate::schema::{validate_fields, FieldKind, FieldSpec, Schema, ValidationErrors};
use ndarray::{arr2, Array2};
use serde::Serialize;
use serde_json::Value;

pub const FEATURE_COUNT: usize = 3;

/// Features in the positional order the classifier was trained on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    pub size: f64,
    pub velocity: f64,
    pub distance: f64,
}

impl FeatureVector {
    pub fn as_array(&self) -> [f64; FEATURE_COUNT] {
        [self.size, self.velocity, self.distance]
    }

    pub fn to_f32_matrix(&self) -> Array2<f32> {
        arr2(&[self.as_array().map(|v| v as f32)])
    }

    pub fn to_f64_matrix(&self) -> Array2<f64> {
        arr2(&[self.as_array()])
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionRequest {
    pub size: f64,
    pub velocity: f64,
    pub distance: f64,
}

impl PredictionRequest {
    pub fn features(&self) -> FeatureVector {
        FeatureVector {
            size: self.size,
            velocity: self.velocity,
            distance: self.distance,
        }
    }
}

const PREDICTION_FIELDS: [FieldSpec; FEATURE_COUNT] = [
    FieldSpec::required("size", FieldKind::Float),
    FieldSpec::required("velocity", FieldKind::Float),
    FieldSpec::required("distance", FieldKind::Float),
];

impl Schema for PredictionRequest {
    fn fields() -> &'static [FieldSpec] {
        &PREDICTION_FIELDS
    }

    fn from_value(body: &Value) -> Result<Self, ValidationErrors> {
        let values = validate_fields(body, Self::fields())?;
        Ok(Self {
            size: values[0],
            velocity: values[1],
            distance: values[2],
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PredictionResponse {
    pub hazardous: bool,
}
