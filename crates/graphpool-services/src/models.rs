//! Graph entities written by the services

use serde::{Deserialize, Serialize};

/// Kind of a class-like declaration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassKind {
    #[default]
    Class,
    Interface,
    Enum,
}

impl ClassKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassKind::Class => "class",
            ClassKind::Interface => "interface",
            ClassKind::Enum => "enum",
        }
    }
}

/// A field declared on a class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyNode {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// A call from a method of one class to a method of another
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodCall {
    pub source_package: String,
    pub source_class: String,
    pub source_method: String,
    pub target_package: String,
    pub target_class: String,
    pub target_method: String,
}

/// A class with its properties and outgoing calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassNode {
    pub name: String,
    #[serde(default)]
    pub package: String,
    pub file_path: String,
    #[serde(rename = "type", default)]
    pub kind: ClassKind,
    #[serde(default)]
    pub properties: Vec<PropertyNode>,
    #[serde(default)]
    pub calls: Vec<MethodCall>,
}
