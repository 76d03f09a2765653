use std::collections::{HashMap, HashSet};

use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat3(Mat3),
    Mat4(Mat4),
}

/// Named shader program with its uniform state. Uniforms are addressed by
/// string name as in the GL contract; a shader permutation may declare names
/// it does not use via `ignore_non_existing_uniform` so that shared binding
/// code does not fail across variants.
pub struct Shader {
    name: String,
    uniforms: HashMap<String, UniformValue>,
    ignored: HashSet<String>,
}

impl Shader {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uniforms: HashMap::new(),
            ignored: HashSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ignore_non_existing_uniform(&mut self, name: &str) {
        self.ignored.insert(name.to_string());
    }

    pub fn ignores(&self, name: &str) -> bool {
        self.ignored.contains(name)
    }

    pub fn set_uniform_bool(&mut self, name: &str, value: bool) {
        self.uniforms.insert(name.to_string(), UniformValue::Bool(value));
    }

    pub fn set_uniform_int(&mut self, name: &str, value: i32) {
        self.uniforms.insert(name.to_string(), UniformValue::Int(value));
    }

    pub fn set_uniform_float(&mut self, name: &str, value: f32) {
        self.uniforms.insert(name.to_string(), UniformValue::Float(value));
    }

    pub fn set_uniform_vec2(&mut self, name: &str, value: Vec2) {
        self.uniforms.insert(name.to_string(), UniformValue::Vec2(value));
    }

    pub fn set_uniform_vec3(&mut self, name: &str, value: Vec3) {
        self.uniforms.insert(name.to_string(), UniformValue::Vec3(value));
    }

    pub fn set_uniform_vec4(&mut self, name: &str, value: Vec4) {
        self.uniforms.insert(name.to_string(), UniformValue::Vec4(value));
    }

    pub fn set_uniform_mat3(&mut self, name: &str, value: Mat3) {
        self.uniforms.insert(name.to_string(), UniformValue::Mat3(value));
    }

    pub fn set_uniform_mat4(&mut self, name: &str, value: Mat4) {
        self.uniforms.insert(name.to_string(), UniformValue::Mat4(value));
    }

    pub fn uniform(&self, name: &str) -> Option<&UniformValue> {
        self.uniforms.get(name)
    }

    pub fn uniform_int(&self, name: &str) -> Option<i32> {
        match self.uniforms.get(name)? {
            UniformValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn uniform_float(&self, name: &str) -> Option<f32> {
        match self.uniforms.get(name)? {
            UniformValue::Float(v) => Some(*v),
            _ => None,
        }
    }
}
