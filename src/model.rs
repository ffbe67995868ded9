//! The inference capability the pipeline runs against.
//!
//! The pipeline only needs three things from a model: its expected input
//! size, a score vector per image, and the label list its output indices
//! map onto. Everything else about the tensor runtime stays behind
//! [`Model`], which keeps the ONNX Runtime dependency at one seam and lets
//! tests substitute an in-memory stand-in.

use std::collections::HashMap;

use log::info;
use ndarray::Array4;
use ort::session::Session;
use ort::value::{Tensor, ValueType};

use crate::classifier::ClassifierError;

/// Input size used when a model declares dynamic spatial dimensions.
const DEFAULT_INPUT_SIDE: u32 = 224;

/// A loaded multi-class image model.
pub trait Model: Send + Sync {
    /// Expected input height and width, in pixels.
    fn input_size(&self) -> (u32, u32);

    /// Runs inference on a `[1, height, width, 3]` pixel tensor and returns
    /// the flat score vector, one entry per output class.
    fn predict(&self, pixels: Array4<f32>) -> Result<Vec<f32>, ClassifierError>;
}

/// A model paired with the ordered labels its output indices map onto.
pub struct LoadedModel {
    pub model: Box<dyn Model>,
    pub class_labels: Vec<String>,
}

impl std::fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModel")
            .field("class_labels", &self.class_labels)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TensorLayout {
    /// `[batch, height, width, channels]`
    Nhwc,
    /// `[batch, channels, height, width]`
    Nchw,
}

/// [`Model`] backed by an ONNX Runtime session.
pub struct OnnxModel {
    session: Session,
    input_name: String,
    layout: TensorLayout,
    input_size: (u32, u32),
}

impl OnnxModel {
    /// Wraps a session, introspecting its declared input shape.
    ///
    /// The model must take a single 4D image tensor; both NHWC and NCHW
    /// layouts are accepted. Dynamic height/width dimensions fall back to
    /// 224.
    pub fn from_session(session: Session) -> Result<Self, ClassifierError> {
        let input = session
            .inputs
            .first()
            .ok_or_else(|| ClassifierError::ModelLoad("model declares no inputs".to_string()))?;
        let input_name = input.name.clone();

        let dimensions = match &input.input_type {
            ValueType::Tensor { dimensions, .. } => dimensions.clone(),
            other => {
                return Err(ClassifierError::ModelLoad(format!(
                    "model input '{}' is not a tensor: {:?}",
                    input_name, other
                )))
            }
        };
        if dimensions.len() != 4 {
            return Err(ClassifierError::ModelLoad(format!(
                "expected a 4D image input, model declares {:?}",
                dimensions
            )));
        }

        let (layout, height, width) = if dimensions[3] == 3 {
            (TensorLayout::Nhwc, dimensions[1], dimensions[2])
        } else if dimensions[1] == 3 {
            (TensorLayout::Nchw, dimensions[2], dimensions[3])
        } else {
            return Err(ClassifierError::ModelLoad(format!(
                "cannot find a 3-channel axis in input shape {:?}",
                dimensions
            )));
        };

        let input_size = (
            positive_or_default(height),
            positive_or_default(width),
        );
        info!(
            "model input '{}': {:?} layout, {}x{}",
            input_name, layout, input_size.0, input_size.1
        );

        Ok(Self {
            session,
            input_name,
            layout,
            input_size,
        })
    }
}

fn positive_or_default(dimension: i64) -> u32 {
    if dimension > 0 {
        dimension as u32
    } else {
        DEFAULT_INPUT_SIDE
    }
}

impl Model for OnnxModel {
    fn input_size(&self) -> (u32, u32) {
        self.input_size
    }

    fn predict(&self, pixels: Array4<f32>) -> Result<Vec<f32>, ClassifierError> {
        // The preprocessor always hands over NHWC; NCHW models get the
        // channel axis moved up front.
        let input_dyn = match self.layout {
            TensorLayout::Nhwc => pixels.into_dyn(),
            TensorLayout::Nchw => pixels.permuted_axes([0, 3, 1, 2]).into_dyn(),
        };
        let input = input_dyn.as_standard_layout();

        let mut input_tensors = HashMap::new();
        input_tensors.insert(
            self.input_name.as_str(),
            Tensor::from_array(&input).map_err(|e| {
                ClassifierError::Inference(format!("failed to create input tensor: {}", e))
            })?,
        );

        // Outputs drop at the end of this scope, releasing the runtime's
        // native buffers with them.
        let outputs = self
            .session
            .run(input_tensors)
            .map_err(|e| ClassifierError::Inference(format!("failed to run model: {}", e)))?;
        let scores = outputs[0].try_extract_tensor::<f32>().map_err(|e| {
            ClassifierError::Inference(format!("failed to extract output tensor: {}", e))
        })?;

        Ok(scores.iter().copied().collect())
    }
}
