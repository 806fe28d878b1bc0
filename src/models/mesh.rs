use serde::{Deserialize, Serialize};

/// 原始网格缓冲区
///
/// 所有数组都是展平后的三元组
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MeshPayload {
    pub vertices: Vec<f32>,
    pub faces: Vec<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normals: Option<Vec<f32>>,
    #[serde(
        default,
        rename = "vertex_colors",
        alias = "vertexColors",
        skip_serializing_if = "Option::is_none"
    )]
    pub vertex_colors: Option<Vec<f32>>,
}

/// 一个任务的网格来源
#[derive(Debug, Clone, PartialEq)]
pub enum MeshSource {
    /// 原始缓冲区，由 GeometryBuilder 组装
    Raw(MeshPayload),
    /// 二进制资源地址（GLTF 等），交给渲染端解析
    Asset { url: String },
}
