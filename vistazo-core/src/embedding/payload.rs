//! Embedding payloads and validated feature vectors.

use serde::{Deserialize, Serialize};

use crate::error::{Result, VistazoError};

/// Dimension of the multimodal image embeddings the vector index holds.
pub const DEFAULT_DIMENSIONS: usize = 1408;

const SHAPE_HINT: &str =
    "expected an array, {embedding}, {imageEmbedding} or {predictions:[{imageEmbedding}]}";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Prediction {
    #[serde(rename = "imageEmbedding")]
    pub image_embedding: Vec<f32>,
}

/// Every accepted way of carrying an embedding.
///
/// Anything else is rejected; there is no key guessing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum EmbeddingPayload {
    /// `[0.1, 0.2, ...]`
    Bare(Vec<f32>),
    /// `{"embedding": [...]}`
    Embedding { embedding: Vec<f32> },
    /// `{"imageEmbedding": [...]}`
    ImageEmbedding {
        #[serde(rename = "imageEmbedding")]
        image_embedding: Vec<f32>,
    },
    /// `{"predictions": [{"imageEmbedding": [...]}]}`
    Predictions { predictions: Vec<Prediction> },
}

impl EmbeddingPayload {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|_| VistazoError::EmbeddingShape(SHAPE_HINT.into()))
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|_| VistazoError::EmbeddingShape(SHAPE_HINT.into()))
    }

    /// Flatten to the raw values. Only the first prediction is used.
    pub fn into_values(self) -> Result<Vec<f32>> {
        match self {
            Self::Bare(values)
            | Self::Embedding { embedding: values }
            | Self::ImageEmbedding {
                image_embedding: values,
            } => Ok(values),
            Self::Predictions { predictions } => predictions
                .into_iter()
                .next()
                .map(|p| p.image_embedding)
                .ok_or_else(|| VistazoError::EmbeddingShape("predictions array is empty".into())),
        }
    }
}

/// An embedding of known dimension with finite components.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FeatureVector(Vec<f32>);

impl FeatureVector {
    pub fn new(values: Vec<f32>, expected_dimensions: usize) -> Result<Self> {
        if values.len() != expected_dimensions {
            return Err(VistazoError::InvalidFeatureVector {
                expected: expected_dimensions,
                actual: values.len(),
            });
        }
        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(VistazoError::VectorSearchError(format!(
                "feature vector component {i} is not a finite number"
            )));
        }
        Ok(Self(values))
    }

    pub fn from_payload(payload: EmbeddingPayload, expected_dimensions: usize) -> Result<Self> {
        Self::new(payload.into_values()?, expected_dimensions)
    }

    /// Scale to unit length. A zero vector is returned unchanged.
    pub fn l2_normalize(mut self) -> Self {
        let norm = self.0.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut self.0 {
                *v /= norm;
            }
        }
        self
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_accepted_shapes() {
        for json in [
            "[1.0, 2.0]",
            r#"{"embedding": [1.0, 2.0]}"#,
            r#"{"imageEmbedding": [1.0, 2.0]}"#,
            r#"{"predictions": [{"imageEmbedding": [1.0, 2.0]}], "deployedModelId": "x"}"#,
        ] {
            let values = EmbeddingPayload::from_json(json)
                .and_then(EmbeddingPayload::into_values)
                .unwrap();
            assert_eq!(values, vec![1.0, 2.0], "{json}");
        }
    }

    #[test]
    fn test_unknown_shapes_are_rejected() {
        for json in [
            r#"{"vector": [1.0]}"#,
            r#"{"data": {"embedding": [1.0]}}"#,
            r#"{"predictions": [{"embedding": [1.0]}]}"#,
            r#""1,2,3""#,
        ] {
            assert!(
                matches!(
                    EmbeddingPayload::from_json(json),
                    Err(VistazoError::EmbeddingShape(_))
                ),
                "{json}"
            );
        }
    }

    #[test]
    fn test_empty_predictions() {
        let payload = EmbeddingPayload::from_json(r#"{"predictions": []}"#).unwrap();
        assert!(matches!(
            payload.into_values(),
            Err(VistazoError::EmbeddingShape(_))
        ));
    }

    #[test]
    fn test_dimension_check() {
        let err = FeatureVector::new(vec![0.0; 3], DEFAULT_DIMENSIONS).unwrap_err();
        assert!(matches!(
            err,
            VistazoError::InvalidFeatureVector {
                expected: 1408,
                actual: 3
            }
        ));
        assert!(FeatureVector::new(vec![0.5; DEFAULT_DIMENSIONS], DEFAULT_DIMENSIONS).is_ok());
    }

    #[test]
    fn test_rejects_non_finite() {
        assert!(FeatureVector::new(vec![1.0, f32::NAN], 2).is_err());
    }

    #[test]
    fn test_l2_normalize() {
        let v = FeatureVector::new(vec![3.0, 4.0], 2).unwrap().l2_normalize();
        assert!((v.as_slice()[0] - 0.6).abs() < 1e-6);
        assert!((v.as_slice()[1] - 0.8).abs() < 1e-6);

        let zero = FeatureVector::new(vec![0.0, 0.0], 2).unwrap().l2_normalize();
        assert_eq!(zero.as_slice(), &[0.0, 0.0]);
    }
}
