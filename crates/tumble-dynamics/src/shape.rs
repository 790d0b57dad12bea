//! Shape descriptors and their mass integrals.
//!
//! Shapes exist here only as mass carriers: the actor consumes their volume,
//! placement, and inertia when deriving body mass properties. Contact
//! generation against these shapes lives outside this crate.

use glam::Vec3;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

use crate::pose::Pose;

// ============================================================================
// Geometry
// ============================================================================

/// Geometric primitive carried by a shape.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ShapeGeometry {
    /// Solid sphere.
    Sphere {
        /// Sphere radius.
        radius: f32,
    },
    /// Solid box.
    Box {
        /// Half extents along each local axis.
        half_extents: Vec3,
    },
    /// Solid capsule: a cylinder along the local Y axis with hemispherical
    /// caps. `half_height` measures half the cylindrical section only.
    Capsule {
        /// Cap and cylinder radius.
        radius: f32,
        /// Half the length of the cylindrical section.
        half_height: f32,
    },
}

impl ShapeGeometry {
    /// Creates a sphere.
    pub fn sphere(radius: f32) -> Self {
        Self::Sphere { radius }
    }

    /// Creates a box from half extents.
    pub fn box_shape(half_extents: Vec3) -> Self {
        Self::Box { half_extents }
    }

    /// Creates a Y-axis capsule.
    pub fn capsule(radius: f32, half_height: f32) -> Self {
        Self::Capsule {
            radius,
            half_height,
        }
    }

    /// The enclosed volume.
    pub fn volume(&self) -> f32 {
        match *self {
            Self::Sphere { radius } => 4.0 / 3.0 * PI * radius.powi(3),
            Self::Box { half_extents } => 8.0 * half_extents.x * half_extents.y * half_extents.z,
            Self::Capsule {
                radius,
                half_height,
            } => {
                PI * radius * radius * (2.0 * half_height) + 4.0 / 3.0 * PI * radius.powi(3)
            }
        }
    }

    /// Diagonal inertia tensor about the centroid, in the shape's own axes,
    /// for the given mass.
    pub fn inertia_about_centroid(&self, mass: f32) -> Vec3 {
        match *self {
            Self::Sphere { radius } => Vec3::splat(0.4 * mass * radius * radius),
            Self::Box { half_extents } => {
                let e = half_extents * 2.0;
                let c = mass / 12.0;
                Vec3::new(
                    c * (e.y * e.y + e.z * e.z),
                    c * (e.x * e.x + e.z * e.z),
                    c * (e.x * e.x + e.y * e.y),
                )
            }
            Self::Capsule {
                radius,
                half_height,
            } => {
                let r = radius;
                let h = 2.0 * half_height;
                let v_cyl = PI * r * r * h;
                let v_caps = 4.0 / 3.0 * PI * r.powi(3);
                let total = v_cyl + v_caps;
                if total <= 0.0 {
                    return Vec3::ZERO;
                }
                let m_cyl = mass * v_cyl / total;
                let m_hemi = mass * v_caps / (2.0 * total);

                // Cylinder about its center, plus both caps carried out to
                // their centroids by the parallel axis theorem.
                let i_cyl_radial = m_cyl * (3.0 * r * r + h * h) / 12.0;
                let i_cyl_axial = 0.5 * m_cyl * r * r;
                let i_hemi = 0.4 * m_hemi * r * r;
                let d = 0.5 * h + 0.375 * r;
                let radial = i_cyl_radial + 2.0 * (i_hemi + m_hemi * d * d);
                let axial = i_cyl_axial + 2.0 * i_hemi;
                Vec3::new(radial, axial, radial)
            }
        }
    }

    /// True when all dimensions are positive and finite.
    pub fn is_valid(&self) -> bool {
        match *self {
            Self::Sphere { radius } => radius.is_finite() && radius > 0.0,
            Self::Box { half_extents } => {
                half_extents.is_finite() && half_extents.min_element() > 0.0
            }
            Self::Capsule {
                radius,
                half_height,
            } => {
                radius.is_finite() && radius > 0.0 && half_height.is_finite() && half_height >= 0.0
            }
        }
    }
}

// ============================================================================
// Shape descriptor
// ============================================================================

/// A shape attached (or to be attached) to an actor.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ShapeDesc {
    /// The primitive.
    pub geometry: ShapeGeometry,
    /// Pose of the shape in actor space.
    pub local_pose: Pose,
    /// Density override used when deriving mass (0 = inherit the actor's).
    pub density: f32,
    /// Explicit mass override; wins over any density when nonzero.
    pub mass: f32,
}

impl ShapeDesc {
    /// Creates a shape at the actor origin with no mass overrides.
    pub fn new(geometry: ShapeGeometry) -> Self {
        Self {
            geometry,
            local_pose: Pose::IDENTITY,
            density: 0.0,
            mass: 0.0,
        }
    }

    /// Sets the pose of the shape in actor space.
    pub fn with_local_pose(mut self, local_pose: Pose) -> Self {
        self.local_pose = local_pose;
        self
    }

    /// Sets a per-shape density override.
    pub fn with_density(mut self, density: f32) -> Self {
        self.density = density;
        self
    }

    /// Sets a per-shape explicit mass.
    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    /// The mass this shape contributes given a fallback density.
    ///
    /// An explicit shape mass wins, then a per-shape density, then the
    /// fallback, applied to the shape volume.
    pub fn derived_mass(&self, fallback_density: f32) -> f32 {
        if self.mass != 0.0 {
            self.mass
        } else {
            let density = if self.density != 0.0 {
                self.density
            } else {
                fallback_density
            };
            self.geometry.volume() * density
        }
    }

    /// True when geometry, pose, and overrides are all well formed.
    pub fn is_valid(&self) -> bool {
        self.geometry.is_valid()
            && self.local_pose.is_finite()
            && self.density.is_finite()
            && self.density >= 0.0
            && self.mass.is_finite()
            && self.mass >= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_volume() {
        let v = ShapeGeometry::sphere(2.0).volume();
        let expected = 4.0 / 3.0 * PI * 8.0;
        assert!((v - expected).abs() < 1e-4, "v = {}", v);
    }

    #[test]
    fn test_box_volume() {
        let v = ShapeGeometry::box_shape(Vec3::new(1.0, 2.0, 3.0)).volume();
        assert!((v - 48.0).abs() < 1e-4, "v = {}", v);
    }

    #[test]
    fn test_capsule_volume_is_cylinder_plus_sphere() {
        let v = ShapeGeometry::capsule(1.0, 2.0).volume();
        let expected = PI * 4.0 + 4.0 / 3.0 * PI;
        assert!((v - expected).abs() < 1e-4, "v = {}", v);
    }

    #[test]
    fn test_sphere_inertia() {
        let i = ShapeGeometry::sphere(0.5).inertia_about_centroid(2.0);
        let expected = 0.4 * 2.0 * 0.25;
        assert!((i.x - expected).abs() < 1e-5, "i = {:?}", i);
        assert_eq!(i.x, i.y);
        assert_eq!(i.y, i.z);
    }

    #[test]
    fn test_box_inertia() {
        // Unit cube of mass 12 has inertia 2 about each axis.
        let i = ShapeGeometry::box_shape(Vec3::splat(0.5)).inertia_about_centroid(12.0);
        assert!((i - Vec3::splat(2.0)).length() < 1e-4, "i = {:?}", i);
    }

    #[test]
    fn test_capsule_inertia_long_axis_smallest() {
        // For a long thin capsule the axial (Y) moment is the small one.
        let i = ShapeGeometry::capsule(0.2, 2.0).inertia_about_centroid(1.0);
        assert!(i.y < i.x, "i = {:?}", i);
        assert_eq!(i.x, i.z);
        assert!(i.min_element() > 0.0);
    }

    #[test]
    fn test_geometry_validity() {
        assert!(ShapeGeometry::sphere(1.0).is_valid());
        assert!(!ShapeGeometry::sphere(0.0).is_valid());
        assert!(!ShapeGeometry::sphere(f32::NAN).is_valid());
        assert!(ShapeGeometry::box_shape(Vec3::ONE).is_valid());
        assert!(!ShapeGeometry::box_shape(Vec3::new(1.0, -1.0, 1.0)).is_valid());
        // A zero-length capsule degenerates to a sphere and stays legal.
        assert!(ShapeGeometry::capsule(1.0, 0.0).is_valid());
        assert!(!ShapeGeometry::capsule(0.0, 1.0).is_valid());
    }

    #[test]
    fn test_derived_mass_precedence() {
        let geometry = ShapeGeometry::sphere(1.0);
        let volume = geometry.volume();

        let plain = ShapeDesc::new(geometry);
        assert!((plain.derived_mass(2.0) - volume * 2.0).abs() < 1e-4);

        let dense = ShapeDesc::new(geometry).with_density(5.0);
        assert!((dense.derived_mass(2.0) - volume * 5.0).abs() < 1e-4);

        let heavy = ShapeDesc::new(geometry).with_density(5.0).with_mass(7.0);
        assert_eq!(heavy.derived_mass(2.0), 7.0);
    }

    #[test]
    fn test_shape_desc_validity() {
        let good = ShapeDesc::new(ShapeGeometry::sphere(1.0));
        assert!(good.is_valid());
        assert!(!good.with_density(-1.0).is_valid());
        assert!(!good.with_mass(f32::INFINITY).is_valid());
        let bad_pose = good.with_local_pose(Pose::from_translation(Vec3::splat(f32::NAN)));
        assert!(!bad_pose.is_valid());
    }
}
