//! Mass property derivation from shape sets.
//!
//! Combines per-shape mass integrals into a total mass, a center of mass,
//! and a diagonalized inertia tensor with its principal axis frame.

use glam::{Mat3, Quat, Vec3};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::pose::Pose;
use crate::shape::ShapeDesc;

// ============================================================================
// Mass properties
// ============================================================================

/// Mass, center of mass, and diagonalized inertia for a body.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MassProperties {
    /// Total mass.
    pub mass: f32,
    /// Pose of the mass frame in actor space: the translation is the center
    /// of mass, the rotation spans the principal axes of inertia.
    pub local_pose: Pose,
    /// Diagonal inertia tensor in the mass frame.
    pub inertia: Vec3,
}

impl MassProperties {
    /// Zero mass properties (no dynamic response).
    pub const ZERO: Self = Self {
        mass: 0.0,
        local_pose: Pose::IDENTITY,
        inertia: Vec3::ZERO,
    };

    /// Derives mass properties from shape volumes at the given density.
    ///
    /// Per-shape density and mass overrides take precedence over `density`
    /// for the shapes that carry them. An empty or zero-volume shape set
    /// yields [`MassProperties::ZERO`].
    pub fn from_shapes_density(shapes: &[ShapeDesc], density: f32) -> Self {
        let masses: Vec<f32> = shapes.iter().map(|s| s.derived_mass(density)).collect();
        Self::combine(shapes, &masses)
    }

    /// Derives the center of mass and inertia from the shapes, then rescales
    /// so the total mass is exactly `total_mass`.
    ///
    /// Shape volumes and overrides only set the relative weighting. A shape
    /// set with no volume collapses to a point mass at the actor origin.
    pub fn from_shapes_total_mass(shapes: &[ShapeDesc], total_mass: f32) -> Self {
        let mut masses: Vec<f32> = shapes.iter().map(|s| s.derived_mass(1.0)).collect();
        let sum: f32 = masses.iter().sum();
        if sum <= 0.0 {
            return Self {
                mass: total_mass,
                local_pose: Pose::IDENTITY,
                inertia: Vec3::ZERO,
            };
        }
        let scale = total_mass / sum;
        for m in &mut masses {
            *m *= scale;
        }
        Self::combine(shapes, &masses)
    }

    fn combine(shapes: &[ShapeDesc], masses: &[f32]) -> Self {
        let mass: f32 = masses.iter().sum();
        if mass <= 0.0 {
            return Self::ZERO;
        }

        // First pass: mass-weighted centroid.
        let mut com = Vec3::ZERO;
        for (shape, &m) in shapes.iter().zip(masses) {
            com += shape.local_pose.translation * m;
        }
        com /= mass;

        // Second pass: full tensor about the centroid in actor axes. Each
        // shape contributes its own rotated tensor plus a parallel axis term
        // for the offset from the centroid.
        let mut tensor = Mat3::ZERO;
        for (shape, &m) in shapes.iter().zip(masses) {
            if m <= 0.0 {
                continue;
            }
            let rot = shape.local_pose.rotation_matrix();
            let own =
                rot * Mat3::from_diagonal(shape.geometry.inertia_about_centroid(m)) * rot.transpose();
            let d = shape.local_pose.translation - com;
            let shift = Mat3::IDENTITY * d.length_squared() - outer(d, d);
            tensor = tensor + own + shift * m;
        }

        let (inertia, rotation) = diagonalize_inertia(tensor);
        Self {
            mass,
            local_pose: Pose::new(com, rotation),
            inertia,
        }
    }
}

fn outer(a: Vec3, b: Vec3) -> Mat3 {
    Mat3::from_cols(a * b.x, a * b.y, a * b.z)
}

// ============================================================================
// Diagonalization
// ============================================================================

/// Diagonalizes a symmetric inertia tensor.
///
/// Returns the principal moments and the rotation whose axes they are
/// measured in, so that `R * diag(moments) * R^T` reproduces the input.
/// The moments are non-negative and the basis is right-handed.
pub fn diagonalize_inertia(tensor: Mat3) -> (Vec3, Quat) {
    // Cyclic Jacobi sweeps; a symmetric 3x3 converges in a handful.
    let cols = tensor.to_cols_array_2d();
    let mut a = [[0.0f32; 3]; 3];
    for (i, row) in a.iter_mut().enumerate() {
        for (j, e) in row.iter_mut().enumerate() {
            *e = cols[j][i];
        }
    }
    let mut v = [[0.0f32; 3], [0.0f32; 3], [0.0f32; 3]];
    v[0][0] = 1.0;
    v[1][1] = 1.0;
    v[2][2] = 1.0;

    for _ in 0..8 {
        let off = a[0][1].abs() + a[0][2].abs() + a[1][2].abs();
        if off < 1e-10 {
            break;
        }
        for (p, q) in [(0usize, 1usize), (0, 2), (1, 2)] {
            let apq = a[p][q];
            if apq.abs() < 1e-12 {
                continue;
            }
            let theta = (a[q][q] - a[p][p]) / (2.0 * apq);
            let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
            let c = 1.0 / (t * t + 1.0).sqrt();
            let s = t * c;

            let app = a[p][p];
            let aqq = a[q][q];
            a[p][p] = app - t * apq;
            a[q][q] = aqq + t * apq;
            a[p][q] = 0.0;
            a[q][p] = 0.0;
            let r = 3 - p - q;
            let arp = a[r][p];
            let arq = a[r][q];
            a[r][p] = c * arp - s * arq;
            a[p][r] = a[r][p];
            a[r][q] = c * arq + s * arp;
            a[q][r] = a[r][q];

            for row in &mut v {
                let vp = row[p];
                let vq = row[q];
                row[p] = c * vp - s * vq;
                row[q] = s * vp + c * vq;
            }
        }
    }

    let mut basis = Mat3::from_cols(
        Vec3::new(v[0][0], v[1][0], v[2][0]),
        Vec3::new(v[0][1], v[1][1], v[2][1]),
        Vec3::new(v[0][2], v[1][2], v[2][2]),
    );
    // Keep the eigenbasis right-handed.
    if basis.determinant() < 0.0 {
        basis.z_axis = -basis.z_axis;
    }
    let moments = Vec3::new(a[0][0].abs(), a[1][1].abs(), a[2][2].abs());
    (moments, Quat::from_mat3(&basis).normalize())
}
