//! Compiling and linking the cube's WGSL program.
//!
//! The vertex and fragment stages arrive as two separate WGSL sources. Linking
//! parses and validates both with naga, checks that the fragment inputs are
//! written by the vertex stage, and resolves the locations the draw pipeline
//! binds against:
//!
//! | Name           | Kind                    | Resolved to           |
//! |----------------|-------------------------|-----------------------|
//! | `position`     | vertex input, `vec3<f32>` | `@location`         |
//! | `tex_coord`    | vertex input, `vec2<f32>` | `@location`         |
//! | `mvp`          | uniform, `mat4x4<f32>`  | `@group` / `@binding` |
//! | `cube_texture` | `texture_2d<f32>`       | `@group` / `@binding` |
//! | `cube_sampler` | `sampler`               | `@group` / `@binding` |
//!
//! The texture and sampler share one bind group, the program's texture unit.
//! `mvp` lives in the other group, and the two groups are 0 and 1.

use std::collections::BTreeMap;

use naga::valid::{Capabilities, ValidationFlags, Validator};
use naga::{AddressSpace, Binding, Module, ShaderStage, TypeInner, VectorSize};

use crate::error::{CubeError, Result};

pub const POSITION_ATTRIBUTE: &str = "position";
pub const TEX_COORD_ATTRIBUTE: &str = "tex_coord";
pub const MVP_UNIFORM: &str = "mvp";
pub const TEXTURE_UNIFORM: &str = "cube_texture";
pub const SAMPLER_UNIFORM: &str = "cube_sampler";

/// Raw WGSL text for both stages.
#[derive(Clone, Debug)]
pub struct ShaderSources {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderSources {
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }

    /// The shaders shipped with the crate.
    pub fn builtin() -> Self {
        Self::new(
            include_str!("shaders/cube_vertex.wgsl"),
            include_str!("shaders/cube_fragment.wgsl"),
        )
    }
}

/// A `@group` / `@binding` pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UniformBinding {
    pub group: u32,
    pub binding: u32,
}

/// A linked program: both validated modules plus resolved locations.
#[derive(Clone, Debug)]
pub struct ShaderProgram {
    vertex: Module,
    fragment: Module,
    vertex_entry: String,
    fragment_entry: String,
    attributes: BTreeMap<String, u32>,
    position_location: u32,
    tex_coord_location: u32,
    mvp: UniformBinding,
    texture: UniformBinding,
    sampler: UniformBinding,
}

impl ShaderProgram {
    /// Compile both stages and link them into a program.
    ///
    /// Parse failures are [`CubeError::ShaderCompile`], validation and
    /// interface mismatches are [`CubeError::Link`], and absent names are
    /// [`CubeError::MissingLocation`].
    pub fn link(sources: &ShaderSources) -> Result<Self> {
        let vertex = compile("vertex", &sources.vertex)?;
        let fragment = compile("fragment", &sources.fragment)?;

        let vertex_entry = entry_point(&vertex, ShaderStage::Vertex)?.to_owned();
        let fragment_entry = entry_point(&fragment, ShaderStage::Fragment)?.to_owned();

        let attributes = located_inputs(&vertex, &vertex_entry);
        let written = located_outputs(&vertex, &vertex_entry);
        for (name, location) in located_inputs(&fragment, &fragment_entry) {
            if !written.contains(&location) {
                return Err(CubeError::Link(format!(
                    "fragment input `{name}` at @location({location}) is not written by the vertex stage"
                )));
            }
        }

        let position_location = *attributes
            .get(POSITION_ATTRIBUTE)
            .ok_or(CubeError::MissingLocation(POSITION_ATTRIBUTE))?;
        let tex_coord_location = *attributes
            .get(TEX_COORD_ATTRIBUTE)
            .ok_or(CubeError::MissingLocation(TEX_COORD_ATTRIBUTE))?;

        let modules = [&vertex, &fragment];
        let mvp = resource(&modules, MVP_UNIFORM, AddressSpace::Uniform)?;
        let texture = resource(&modules, TEXTURE_UNIFORM, AddressSpace::Handle)?;
        let sampler = resource(&modules, SAMPLER_UNIFORM, AddressSpace::Handle)?;

        if !is_mat4(&modules, MVP_UNIFORM) {
            return Err(CubeError::Link(format!("`{MVP_UNIFORM}` must be a mat4x4<f32>")));
        }
        if texture.group != sampler.group {
            return Err(CubeError::Link(format!(
                "`{TEXTURE_UNIFORM}` and `{SAMPLER_UNIFORM}` must share a bind group"
            )));
        }
        let mut groups = [mvp.group, texture.group];
        groups.sort_unstable();
        if groups != [0, 1] {
            return Err(CubeError::Link(format!(
                "uniforms must use bind groups 0 and 1, found {} and {}",
                mvp.group, texture.group
            )));
        }

        Ok(Self {
            vertex,
            fragment,
            vertex_entry,
            fragment_entry,
            attributes,
            position_location,
            tex_coord_location,
            mvp,
            texture,
            sampler,
        })
    }

    /// Location of a named vertex input, like `glGetAttribLocation`.
    pub fn attribute_location(&self, name: &str) -> Option<u32> {
        self.attributes.get(name).copied()
    }

    /// Binding of a named uniform, like `glGetUniformLocation`.
    pub fn uniform_binding(&self, name: &str) -> Option<UniformBinding> {
        match name {
            MVP_UNIFORM => Some(self.mvp),
            TEXTURE_UNIFORM => Some(self.texture),
            SAMPLER_UNIFORM => Some(self.sampler),
            _ => None,
        }
    }

    pub fn position_location(&self) -> u32 {
        self.position_location
    }

    pub fn tex_coord_location(&self) -> u32 {
        self.tex_coord_location
    }

    pub fn mvp_binding(&self) -> UniformBinding {
        self.mvp
    }

    pub fn texture_binding(&self) -> UniformBinding {
        self.texture
    }

    pub fn sampler_binding(&self) -> UniformBinding {
        self.sampler
    }

    /// The bind group holding the texture and sampler.
    pub fn texture_unit(&self) -> u32 {
        self.texture.group
    }

    pub fn vertex_module(&self) -> &Module {
        &self.vertex
    }

    pub fn fragment_module(&self) -> &Module {
        &self.fragment
    }

    pub fn vertex_entry(&self) -> &str {
        &self.vertex_entry
    }

    pub fn fragment_entry(&self) -> &str {
        &self.fragment_entry
    }
}

fn compile(stage: &'static str, source: &str) -> Result<Module> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| CubeError::ShaderCompile {
        stage,
        message: e.emit_to_string(source),
    })?;

    Validator::new(ValidationFlags::all(), Capabilities::empty())
        .validate(&module)
        .map_err(|e| CubeError::Link(format!("{stage} stage: {}", e.into_inner())))?;

    Ok(module)
}

fn entry_point(module: &Module, stage: ShaderStage) -> Result<&str> {
    module
        .entry_points
        .iter()
        .find(|ep| ep.stage == stage)
        .map(|ep| ep.name.as_str())
        .ok_or_else(|| CubeError::Link(format!("no {stage:?} entry point")))
}

fn find_entry<'m>(module: &'m Module, name: &str) -> Option<&'m naga::EntryPoint> {
    module.entry_points.iter().find(|ep| ep.name == name)
}

/// Named `@location` inputs of an entry point, looking through struct arguments.
fn located_inputs(module: &Module, entry: &str) -> BTreeMap<String, u32> {
    let mut inputs = BTreeMap::new();
    let Some(ep) = find_entry(module, entry) else {
        return inputs;
    };

    for arg in &ep.function.arguments {
        match (&arg.binding, &module.types[arg.ty].inner) {
            (Some(Binding::Location { location, .. }), _) => {
                if let Some(name) = &arg.name {
                    inputs.insert(name.clone(), *location);
                }
            }
            (None, TypeInner::Struct { members, .. }) => {
                for member in members {
                    if let (Some(Binding::Location { location, .. }), Some(name)) =
                        (&member.binding, &member.name)
                    {
                        inputs.insert(name.clone(), *location);
                    }
                }
            }
            _ => {}
        }
    }
    inputs
}

/// `@location` outputs of an entry point.
fn located_outputs(module: &Module, entry: &str) -> Vec<u32> {
    let Some(result) = find_entry(module, entry).and_then(|ep| ep.function.result.as_ref()) else {
        return Vec::new();
    };

    match (&result.binding, &module.types[result.ty].inner) {
        (Some(Binding::Location { location, .. }), _) => vec![*location],
        (None, TypeInner::Struct { members, .. }) => members
            .iter()
            .filter_map(|m| match m.binding {
                Some(Binding::Location { location, .. }) => Some(location),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Resolve a global resource by name across both stages.
///
/// A resource declared by both stages must agree on its binding.
fn resource(modules: &[&Module], name: &'static str, space: AddressSpace) -> Result<UniformBinding> {
    let mut found: Option<UniformBinding> = None;

    for module in modules {
        for (_, var) in module.global_variables.iter() {
            if var.name.as_deref() != Some(name) || var.space != space {
                continue;
            }
            let Some(rb) = &var.binding else {
                continue;
            };
            let binding = UniformBinding {
                group: rb.group,
                binding: rb.binding,
            };
            match found {
                Some(existing) if existing != binding => {
                    return Err(CubeError::Link(format!(
                        "`{name}` is bound differently in the two stages"
                    )));
                }
                _ => found = Some(binding),
            }
        }
    }

    found.ok_or(CubeError::MissingLocation(name))
}

fn is_mat4(modules: &[&Module], name: &str) -> bool {
    modules.iter().any(|module| {
        module.global_variables.iter().any(|(_, var)| {
            var.name.as_deref() == Some(name)
                && matches!(
                    module.types[var.ty].inner,
                    TypeInner::Matrix {
                        columns: VectorSize::Quad,
                        rows: VectorSize::Quad,
                        ..
                    }
                )
        })
    })
}
