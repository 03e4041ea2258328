//! Image classification.
//!
//! The executor files in-progress tickets under
//! `resource_pool/<instance-type>-<job-type>/`, so the requester must derive
//! the same instance type and job type from an image URI that the executor
//! does. Classification is a plain substring scan over a fixed table.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Framework under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Framework {
    Mxnet,
    Pytorch,
    Tensorflow,
}

/// Frameworks in match precedence order.
///
/// Earlier entries win when an image names more than one, so
/// `huggingface-pytorch-training` is a pytorch image even if its tag also
/// mentions tensorflow.
const FRAMEWORK_TABLE: &[(&str, Framework)] = &[
    ("mxnet", Framework::Mxnet),
    ("pytorch", Framework::Pytorch),
    ("tensorflow", Framework::Tensorflow),
];

impl Framework {
    /// Find the highest-precedence framework named in `image`.
    pub fn detect(image: &str) -> Option<Self> {
        FRAMEWORK_TABLE
            .iter()
            .find(|(pattern, _)| image.contains(pattern))
            .map(|(_, framework)| *framework)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mxnet => "mxnet",
            Self::Pytorch => "pytorch",
            Self::Tensorflow => "tensorflow",
        }
    }

    /// Parse the exact lowercase label used in ticket names.
    pub fn from_label(label: &str) -> Option<Self> {
        FRAMEWORK_TABLE
            .iter()
            .find(|(pattern, _)| *pattern == label)
            .map(|(_, framework)| *framework)
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of test job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobType {
    Training,
    Inference,
}

impl JobType {
    /// `training` wins over `inference` when both appear.
    pub fn detect(image: &str) -> Option<Self> {
        if image.contains("training") {
            Some(Self::Training)
        } else if image.contains("inference") {
            Some(Self::Inference)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Training => "training",
            Self::Inference => "inference",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Processor the image is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accelerator {
    Gpu,
    Cpu,
}

impl Accelerator {
    pub fn detect(image: &str) -> Self {
        if image.contains("gpu") {
            Self::Gpu
        } else {
            Self::Cpu
        }
    }
}

/// Instance type used to test each (framework, accelerator) pair.
pub fn instance_type_for(framework: Framework, accelerator: Accelerator) -> &'static str {
    match (framework, accelerator) {
        (Framework::Tensorflow, Accelerator::Gpu) => "ml.p3.8xlarge",
        (Framework::Tensorflow, Accelerator::Cpu) => "ml.c4.4xlarge",
        (_, Accelerator::Gpu) => "ml.p2.8xlarge",
        (_, Accelerator::Cpu) => "ml.c4.8xlarge",
    }
}

/// Everything the protocol derives from an image URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageProfile {
    pub framework: Framework,
    pub job_type: JobType,
    pub accelerator: Accelerator,
    pub instance_type: &'static str,
}

impl ImageProfile {
    /// Classify an image URI.
    ///
    /// Fails with `InvalidImage` when the URI names neither `training` nor
    /// `inference`, or none of the supported frameworks.
    pub fn classify(image: &str) -> Result<Self, ProtocolError> {
        let job_type = JobType::detect(image).ok_or_else(|| {
            ProtocolError::invalid_image(image, "job type (training/inference) not stated in image tag")
        })?;
        let framework = Framework::detect(image).ok_or_else(|| {
            ProtocolError::invalid_image(image, "no supported framework (mxnet/pytorch/tensorflow) in image")
        })?;
        let accelerator = Accelerator::detect(image);

        Ok(Self {
            framework,
            job_type,
            accelerator,
            instance_type: instance_type_for(framework, accelerator),
        })
    }

    /// Resource-pool sub-folder for this image: `<instance-type>-<job-type>`.
    pub fn pool_name(&self) -> String {
        format!("{}-{}", self.instance_type, self.job_type)
    }
}
