//! Static cube geometry mapped onto a cross-layout image.
//!
//! The cube spans -1..1 on every axis and is built from 24 vertices (four per
//! face) so each face can carry its own texture coordinates. Positions and
//! texels live in separate arrays and are uploaded to separate vertex buffers.
//!
//! # Cross layout
//!
//! The source image is split into a 4×4 grid of square cells. With `v = 0`
//! at the top of the image the faces sit at:
//!
//! ```text
//!          +--------+
//!          | bottom |
//! +--------+--------+--------+--------+
//! |  back  |  left  | front  | right  |
//! +--------+--------+--------+--------+
//!          |  top   |
//!          +--------+
//! ```
//!
//! The bottom row of the grid is unused.
//!
//! The texels pull each face slightly inside its cell so nearest-neighbor
//! sampling never bleeds a neighboring face onto the edge.

/// Number of `f32` components per vertex position.
pub const POSITION_COMPONENTS: usize = 3;

/// Number of `f32` components per texture coordinate.
pub const TEXEL_COMPONENTS: usize = 2;

#[rustfmt::skip]
const CUBE_POSITIONS: [[f32; 3]; 24] = [
    // front
    [-1.0, -1.0,  1.0], [ 1.0, -1.0,  1.0], [ 1.0,  1.0,  1.0], [-1.0,  1.0,  1.0],
    // back
    [-1.0, -1.0, -1.0], [-1.0,  1.0, -1.0], [ 1.0,  1.0, -1.0], [ 1.0, -1.0, -1.0],
    // top
    [-1.0,  1.0, -1.0], [-1.0,  1.0,  1.0], [ 1.0,  1.0,  1.0], [ 1.0,  1.0, -1.0],
    // bottom
    [-1.0, -1.0, -1.0], [ 1.0, -1.0, -1.0], [ 1.0, -1.0,  1.0], [-1.0, -1.0,  1.0],
    // right
    [ 1.0, -1.0, -1.0], [ 1.0,  1.0, -1.0], [ 1.0,  1.0,  1.0], [ 1.0, -1.0,  1.0],
    // left
    [-1.0, -1.0, -1.0], [-1.0, -1.0,  1.0], [-1.0,  1.0,  1.0], [-1.0,  1.0, -1.0],
];

#[rustfmt::skip]
const CUBE_TEXELS: [[f32; 2]; 24] = [
    // front
    [0.4999, 0.2499], [0.74999, 0.24999], [0.74999, 0.498], [0.4999, 0.498],
    // back
    [0.249, 0.251], [0.249, 0.498], [0.0, 0.498], [0.0, 0.251],
    // top
    [0.251, 0.498], [0.499, 0.498], [0.499, 0.749], [0.251, 0.749],
    // bottom
    [0.251, 0.249], [0.251, 0.0], [0.499, 0.0], [0.499, 0.249],
    // right
    [1.0, 0.2511], [1.0, 0.499], [0.74999, 0.499], [0.74999, 0.2511],
    // left
    [0.24999, 0.24999], [0.4999, 0.24999], [0.4999, 0.4999], [0.24999, 0.4999],
];

#[rustfmt::skip]
const CUBE_INDICES: [u16; 36] = [
    0, 1, 2, 0, 2, 3,       // front
    4, 5, 6, 4, 6, 7,       // back
    8, 9, 10, 8, 10, 11,    // top
    12, 13, 14, 12, 14, 15, // bottom
    16, 17, 18, 16, 18, 19, // right
    20, 21, 22, 20, 22, 23, // left
];

/// Immutable cube vertex, texel and index data.
#[derive(Clone, Debug)]
pub struct GeometryBuffer {
    positions: &'static [[f32; 3]],
    texels: &'static [[f32; 2]],
    indices: &'static [u16],
}

impl Default for GeometryBuffer {
    fn default() -> Self {
        Self::cube()
    }
}

impl GeometryBuffer {
    /// The cross-layout textured cube.
    pub fn cube() -> Self {
        Self {
            positions: &CUBE_POSITIONS,
            texels: &CUBE_TEXELS,
            indices: &CUBE_INDICES,
        }
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        self.positions
    }

    pub fn texels(&self) -> &[[f32; 2]] {
        self.texels
    }

    pub fn indices(&self) -> &[u16] {
        self.indices
    }

    /// Number of indices issued by one draw call.
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Position bytes ready for a vertex buffer upload.
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.positions)
    }

    /// Texel bytes ready for a vertex buffer upload.
    pub fn texel_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.texels)
    }

    /// Index bytes ready for an index buffer upload.
    ///
    /// wgpu wants buffer sizes padded to four bytes; 36 `u16` indices already are.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.indices)
    }
}
