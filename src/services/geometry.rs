//! 网格组装服务 - 业务能力层
//!
//! 把展平的数值缓冲区组装成可渲染的几何体，缺少法线时按面积加权计算顶点法线

use crate::error::GeometryError;
use crate::models::MeshPayload;

/// 可渲染几何体
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub positions: Vec<[f32; 3]>,
    pub triangles: Vec<[u32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub colors: Option<Vec<[f32; 3]>>,
}

impl Geometry {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }
}

fn malformed(reason: impl Into<String>) -> GeometryError {
    GeometryError::MalformedPayload(reason.into())
}

fn triples(values: &[f32]) -> Vec<[f32; 3]> {
    values.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect()
}

fn sub(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn normalize(v: [f32; 3]) -> [f32; 3] {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if len > 0.0 && len.is_finite() {
        [v[0] / len, v[1] / len, v[2] / len]
    } else {
        [0.0, 0.0, 0.0]
    }
}

/// 网格组装
///
/// 无状态；每次调用都生成新的几何体
pub struct GeometryBuilder;

impl GeometryBuilder {
    pub fn build(payload: &MeshPayload) -> Result<Geometry, GeometryError> {
        if payload.vertices.len() % 3 != 0 {
            return Err(malformed(format!(
                "顶点数组长度 {} 不是 3 的倍数",
                payload.vertices.len()
            )));
        }
        if payload.faces.len() % 3 != 0 {
            return Err(malformed(format!(
                "面数组长度 {} 不是 3 的倍数",
                payload.faces.len()
            )));
        }

        let vertex_count = payload.vertices.len() / 3;
        if let Some(index) = payload.faces.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(malformed(format!(
                "面索引 {} 超出顶点数 {}",
                index, vertex_count
            )));
        }

        if let Some(normals) = &payload.normals {
            if normals.len() != payload.vertices.len() {
                return Err(malformed(format!(
                    "法线数组长度 {} 与顶点数组长度 {} 不一致",
                    normals.len(),
                    payload.vertices.len()
                )));
            }
        }
        if let Some(colors) = &payload.vertex_colors {
            if colors.len() != payload.vertices.len() {
                return Err(malformed(format!(
                    "颜色数组长度 {} 与顶点数组长度 {} 不一致",
                    colors.len(),
                    payload.vertices.len()
                )));
            }
        }

        let positions = triples(&payload.vertices);
        let triangles: Vec<[u32; 3]> = payload
            .faces
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect();

        let normals = match &payload.normals {
            Some(normals) => triples(normals),
            None => vertex_normals(&positions, &triangles),
        };

        Ok(Geometry {
            positions,
            triangles,
            normals,
            colors: payload.vertex_colors.as_deref().map(triples),
        })
    }
}

/// 面积加权的顶点法线
///
/// 未归一化的叉积长度是三角形面积的两倍，直接累加即为面积加权；
/// 退化三角形的叉积为零，不影响结果
fn vertex_normals(positions: &[[f32; 3]], triangles: &[[u32; 3]]) -> Vec<[f32; 3]> {
    let mut sums = vec![[0.0f32; 3]; positions.len()];

    for &[a, b, c] in triangles {
        let (a, b, c) = (a as usize, b as usize, c as usize);
        let face = cross(sub(positions[b], positions[a]), sub(positions[c], positions[a]));
        if !face.iter().all(|v| v.is_finite()) {
            continue;
        }
        for index in [a, b, c] {
            for axis in 0..3 {
                sums[index][axis] += face[axis];
            }
        }
    }

    sums.into_iter().map(normalize).collect()
}
