use async_trait::async_trait;
use aws_sdk_rekognition::types::{Image, Label, S3Object};
use thiserror::Error;

use crate::bounding_box::NormalizedBox;

#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("detect labels call failed: {0}")]
    Request(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// A label the service assigned to the image, with its localized instances in
/// service order.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedLabel {
    pub name: String,
    pub confidence: f32,
    pub instances: Vec<LabelInstance>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelInstance {
    pub bounding_box: NormalizedBox,
}

#[async_trait]
pub trait LabelDetector: Send + Sync {
    /// Detects up to `max_labels` labels for the object at `bucket`/`key`.
    /// The returned ordering is the service's ranking.
    async fn detect_labels(
        &self,
        bucket: &str,
        key: &str,
        max_labels: i32,
    ) -> Result<Vec<DetectedLabel>, DetectionError>;
}

pub struct RekognitionDetector {
    client: aws_sdk_rekognition::Client,
}

impl RekognitionDetector {
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_rekognition::Client::new(sdk_config),
        }
    }
}

#[async_trait]
impl LabelDetector for RekognitionDetector {
    #[tracing::instrument(skip(self))]
    async fn detect_labels(
        &self,
        bucket: &str,
        key: &str,
        max_labels: i32,
    ) -> Result<Vec<DetectedLabel>, DetectionError> {
        let reference = Image::builder()
            .s3_object(S3Object::builder().bucket(bucket).name(key).build())
            .build();

        let response = self
            .client
            .detect_labels()
            .image(reference)
            .max_labels(max_labels)
            .send()
            .await
            .map_err(|e| DetectionError::Request(Box::new(e)))?;

        let labels: Vec<DetectedLabel> = response.labels().iter().map(convert_label).collect();
        tracing::debug!("Service returned {} labels", labels.len());

        Ok(labels)
    }
}

// Instances without a bounding box carry nothing we can draw, so they are
// dropped during conversion.
fn convert_label(label: &Label) -> DetectedLabel {
    let instances = label
        .instances()
        .iter()
        .filter_map(|instance| instance.bounding_box())
        .map(|bbox| LabelInstance {
            bounding_box: NormalizedBox {
                left: bbox.left().unwrap_or(0.0),
                top: bbox.top().unwrap_or(0.0),
                width: bbox.width().unwrap_or(0.0),
                height: bbox.height().unwrap_or(0.0),
            },
        })
        .collect();

    DetectedLabel {
        name: label.name().unwrap_or_default().to_string(),
        confidence: label.confidence().unwrap_or(0.0),
        instances,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_rekognition::types::{BoundingBox, Instance};

    #[test]
    fn test_convert_label_keeps_name_confidence_and_boxes() {
        let label = Label::builder()
            .name("Person")
            .confidence(98.5)
            .instances(
                Instance::builder()
                    .bounding_box(
                        BoundingBox::builder()
                            .left(0.1)
                            .top(0.2)
                            .width(0.3)
                            .height(0.4)
                            .build(),
                    )
                    .build(),
            )
            .build();

        let converted = convert_label(&label);

        assert_eq!(converted.name, "Person");
        assert_eq!(converted.confidence, 98.5);
        assert_eq!(
            converted.instances,
            vec![LabelInstance {
                bounding_box: NormalizedBox {
                    left: 0.1,
                    top: 0.2,
                    width: 0.3,
                    height: 0.4,
                },
            }]
        );
    }

    #[test]
    fn test_convert_label_drops_instances_without_boxes() {
        let label = Label::builder()
            .name("Car")
            .confidence(77.0)
            .instances(Instance::builder().build())
            .instances(
                Instance::builder()
                    .bounding_box(
                        BoundingBox::builder()
                            .left(0.5)
                            .top(0.5)
                            .width(0.25)
                            .height(0.25)
                            .build(),
                    )
                    .build(),
            )
            .build();

        let converted = convert_label(&label);

        assert_eq!(converted.instances.len(), 1);
        assert_eq!(converted.instances[0].bounding_box.left, 0.5);
    }

    #[test]
    fn test_convert_label_defaults_missing_fields() {
        let label = Label::builder().build();

        let converted = convert_label(&label);

        assert_eq!(converted.name, "");
        assert_eq!(converted.confidence, 0.0);
        assert!(converted.instances.is_empty());
    }
}
