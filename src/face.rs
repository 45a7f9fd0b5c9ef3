//! Face model: named blend-shape channels across sub-meshes.
//!
//! Mirrors the morph-target layout of glTF-style avatars: each sub-mesh
//! carries a name→index dictionary and a dense influence array. Avatars
//! commonly split the face across meshes (head, teeth, tongue), so a named
//! channel present on several sub-meshes is always written on all of them.

use std::collections::HashMap;

/// Weights below this snap to exactly zero during decay, so a silent face
/// settles at the idle pose instead of holding denormal residue.
const WEIGHT_EPSILON: f32 = 1e-3;

/// One sub-mesh with morph targets.
#[derive(Debug, Clone)]
pub struct FaceMesh {
    name: String,
    dictionary: HashMap<String, usize>,
    weights: Vec<f32>,
}

impl FaceMesh {
    /// Build a mesh from its morph-target names, in dictionary order.
    pub fn new(name: impl Into<String>, channels: &[&str]) -> Self {
        let dictionary: HashMap<String, usize> = channels
            .iter()
            .enumerate()
            .map(|(index, channel)| ((*channel).to_owned(), index))
            .collect();
        let weights = vec![0.0; channels.len()];
        Self {
            name: name.into(),
            dictionary,
            weights,
        }
    }

    /// Mesh name, for diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current weight of a named channel, if the mesh has it.
    pub fn weight(&self, channel: &str) -> Option<f32> {
        self.dictionary.get(channel).map(|&index| self.weights[index])
    }

    /// Influence array, index-aligned with the dictionary.
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Number of morph-target channels on this mesh.
    pub fn channel_count(&self) -> usize {
        self.dictionary.len()
    }

    fn set(&mut self, channel: &str, value: f32) -> bool {
        match self.dictionary.get(channel) {
            Some(&index) => {
                self.weights[index] = value;
                true
            }
            None => false,
        }
    }
}

/// The full face: every sub-mesh that carries mouth blend shapes.
///
/// Outside a playback session all weights are zero (the idle pose). There
/// is exactly one mutator — the face driver, on the UI thread — so no
/// synchronization is needed.
#[derive(Debug, Clone, Default)]
pub struct FaceModel {
    meshes: Vec<FaceMesh>,
}

impl FaceModel {
    /// Assemble a face from its sub-meshes.
    pub fn new(meshes: Vec<FaceMesh>) -> Self {
        Self { meshes }
    }

    /// True when no sub-mesh exposes any blend-shape channel; lip-sync on
    /// such an asset is a visual no-op.
    pub fn is_unmapped(&self) -> bool {
        self.meshes.iter().all(|mesh| mesh.dictionary.is_empty())
    }

    /// Sub-meshes, for the host to copy influences back to its scene.
    pub fn meshes(&self) -> &[FaceMesh] {
        &self.meshes
    }

    /// Set `channel` on every sub-mesh that has it, clamped to \[0, 1\].
    /// Returns whether any mesh matched.
    pub fn set_weight(&mut self, channel: &str, value: f32) -> bool {
        let value = value.clamp(0.0, 1.0);
        let mut matched = false;
        for mesh in &mut self.meshes {
            matched |= mesh.set(channel, value);
        }
        matched
    }

    /// Largest current weight of `channel` across sub-meshes, if any has it.
    pub fn weight(&self, channel: &str) -> Option<f32> {
        self.meshes
            .iter()
            .filter_map(|mesh| mesh.weight(channel))
            .reduce(f32::max)
    }

    /// Multiply every weight by `factor`, snapping near-zero values to
    /// exactly zero. This is the per-frame decay step.
    pub fn scale_all(&mut self, factor: f32) {
        for mesh in &mut self.meshes {
            for weight in &mut mesh.weights {
                *weight *= factor;
                if *weight < WEIGHT_EPSILON {
                    *weight = 0.0;
                }
            }
        }
    }

    /// Hard-reset every weight on every sub-mesh to exactly zero.
    pub fn reset(&mut self) {
        for mesh in &mut self.meshes {
            mesh.weights.fill(0.0);
        }
    }

    /// Largest weight anywhere on the face.
    pub fn max_weight(&self) -> f32 {
        self.meshes
            .iter()
            .flat_map(|mesh| mesh.weights.iter().copied())
            .fold(0.0, f32::max)
    }
}
