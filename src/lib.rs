//! Load CloudFormation templates, resolve their intrinsic functions and
//! read resources back as typed values.
//!
//! ```
//! use cfn_resolve::resources::s3::Bucket;
//! use cfn_resolve::Template;
//!
//! let template = Template::from_json(br#"{
//!     "Resources": {
//!         "Assets": {
//!             "Type": "AWS::S3::Bucket",
//!             "Properties": { "BucketName": { "Fn::Sub": "${AWS::StackName}-assets" } }
//!         }
//!     }
//! }"#)?;
//!
//! let bucket: Bucket = template.get("Assets")?;
//! assert_eq!(bucket.bucket_name.as_deref(), Some("cfn-resolve-stack-assets"));
//! # Ok::<(), cfn_resolve::Error>(())
//! ```

pub mod cfn_yaml;
pub mod error;
pub mod intrinsics;
pub mod resources;
pub mod template;

pub use error::{Error, Result};
pub use intrinsics::{
    process_json, process_yaml, resolve, Context, IntrinsicHandler, ProcessorOptions,
    PseudoParameters,
};
pub use resources::Resource;
pub use template::{Format, Template};
