//! Embree 4 intersection backend.
//!
//! Manual FFI bindings to Intel Embree 4, avoiding bindgen dependency.
//! Only includes the minimal API needed for single-level triangle scenes.

use std::ffi::c_void;

use glint_math::{Aabb, Ray, Vec3};

use super::{
    validate_triangles, BackendError, CommittedScene, GeometryId, IntersectionBackend, SurfaceHit,
};

// ============================================================================
// Embree FFI Bindings
// ============================================================================

#[allow(non_camel_case_types)]
type RTCDevice = *mut c_void;

#[allow(non_camel_case_types)]
type RTCScene = *mut c_void;

#[allow(non_camel_case_types)]
type RTCGeometry = *mut c_void;

// Embree geometry types (from rtcore_geometry.h)
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum RTCGeometryType {
    Triangle = 0, // RTC_GEOMETRY_TYPE_TRIANGLE
}

// Embree buffer type
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum RTCBufferType {
    Index = 0,
    Vertex = 1,
}

// Embree buffer format (from rtcore_common.h)
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum RTCFormat {
    UInt3 = 0x5003,  // RTC_FORMAT_UINT = 0x5001, +2 for UINT3
    Float3 = 0x9003, // RTC_FORMAT_FLOAT = 0x9001, +2 for FLOAT3
}

// Ray structure matching Embree's RTCRay
#[repr(C, align(16))]
#[derive(Debug, Copy, Clone)]
#[allow(dead_code)]
struct RTCRay {
    org_x: f32,
    org_y: f32,
    org_z: f32,
    tnear: f32,

    dir_x: f32,
    dir_y: f32,
    dir_z: f32,
    time: f32,

    tfar: f32,
    mask: u32,
    id: u32,
    flags: u32,
}

// Hit structure matching Embree's RTCHit
#[repr(C, align(16))]
#[derive(Debug, Copy, Clone)]
#[allow(dead_code)]
struct RTCHit {
    ng_x: f32,
    ng_y: f32,
    ng_z: f32,

    u: f32,
    v: f32,

    prim_id: u32,
    geom_id: u32,
    inst_id: [u32; 1],
}

// Combined ray-hit structure for rtcIntersect1
#[repr(C, align(16))]
#[derive(Debug, Copy, Clone)]
struct RTCRayHit {
    ray: RTCRay,
    hit: RTCHit,
}

// Bounds structure for rtcGetSceneBounds
#[repr(C)]
#[derive(Debug, Copy, Clone, Default)]
#[allow(dead_code)]
struct RTCBounds {
    lower_x: f32,
    lower_y: f32,
    lower_z: f32,
    align0: f32,

    upper_x: f32,
    upper_y: f32,
    upper_z: f32,
    align1: f32,
}

// Invalid geometry ID constant
const RTC_INVALID_GEOMETRY_ID: u32 = 0xFFFFFFFF;

// Embree C API functions
#[link(name = "embree4")]
extern "C" {
    fn rtcNewDevice(config: *const std::ffi::c_char) -> RTCDevice;
    fn rtcReleaseDevice(device: RTCDevice);
    fn rtcGetDeviceError(device: RTCDevice) -> i32;

    fn rtcNewScene(device: RTCDevice) -> RTCScene;
    fn rtcReleaseScene(scene: RTCScene);
    fn rtcCommitScene(scene: RTCScene);
    fn rtcGetSceneBounds(scene: RTCScene, bounds: *mut RTCBounds);

    fn rtcNewGeometry(device: RTCDevice, geom_type: RTCGeometryType) -> RTCGeometry;
    fn rtcReleaseGeometry(geom: RTCGeometry);
    fn rtcCommitGeometry(geom: RTCGeometry);
    fn rtcAttachGeometry(scene: RTCScene, geom: RTCGeometry) -> u32;

    fn rtcSetSharedGeometryBuffer(
        geom: RTCGeometry,
        buffer_type: u32,
        slot: u32,
        format: u32,
        ptr: *const c_void,
        byte_offset: usize,
        byte_stride: usize,
        item_count: usize,
    );

    fn rtcIntersect1(
        scene: RTCScene,
        rayhit: *mut RTCRayHit,
        args: *const c_void, // RTCIntersectArguments*, can be NULL
    );

    fn rtcOccluded1(
        scene: RTCScene,
        ray: *mut RTCRay,
        args: *const c_void, // RTCOccludedArguments*, can be NULL
    );
}

// ============================================================================
// Helper Functions
// ============================================================================

impl RTCRay {
    fn from_ray(ray: &Ray) -> Self {
        Self {
            org_x: ray.origin.x,
            org_y: ray.origin.y,
            org_z: ray.origin.z,
            tnear: ray.bounds.min,

            dir_x: ray.direction.x,
            dir_y: ray.direction.y,
            dir_z: ray.direction.z,
            time: 0.0,

            tfar: ray.bounds.max,
            mask: 0xFFFFFFFF,
            id: 0,
            flags: 0,
        }
    }
}

impl RTCRayHit {
    fn from_ray(ray: &Ray) -> Self {
        Self {
            ray: RTCRay::from_ray(ray),
            hit: RTCHit {
                ng_x: 0.0,
                ng_y: 0.0,
                ng_z: 0.0,
                u: 0.0,
                v: 0.0,
                prim_id: RTC_INVALID_GEOMETRY_ID,
                geom_id: RTC_INVALID_GEOMETRY_ID,
                inst_id: [RTC_INVALID_GEOMETRY_ID],
            },
        }
    }
}

fn check_device(device: RTCDevice) -> Result<(), BackendError> {
    // SAFETY: device is a live handle returned by rtcNewDevice
    let code = unsafe { rtcGetDeviceError(device) };
    if code != 0 {
        return Err(BackendError::Embree { code });
    }
    Ok(())
}

// ============================================================================
// Embree handles
// ============================================================================

/// Device and scene handles, released together.
struct EmbreeHandles {
    device: RTCDevice,
    scene: RTCScene,
}

impl Drop for EmbreeHandles {
    fn drop(&mut self) {
        unsafe {
            rtcReleaseScene(self.scene);
            rtcReleaseDevice(self.device);
        }
    }
}

// ============================================================================
// EmbreeBackend - geometry registration
// ============================================================================

/// Embree device and scene under construction.
///
/// Vertex and index buffers are shared with Embree, so they are owned here
/// and handed on to the committed scene.
pub struct EmbreeBackend {
    handles: EmbreeHandles,
    vertex_buffers: Vec<Vec<f32>>,
    index_buffers: Vec<Vec<u32>>,
    triangle_count: usize,
}

impl EmbreeBackend {
    pub fn new() -> Result<Self, BackendError> {
        // SAFETY: null config selects the default device; handles are
        // checked before use and released on every error path.
        unsafe {
            let device = rtcNewDevice(std::ptr::null());
            if device.is_null() {
                return Err(BackendError::DeviceCreation(
                    "rtcNewDevice returned null".to_string(),
                ));
            }
            if let Err(e) = check_device(device) {
                rtcReleaseDevice(device);
                return Err(e);
            }

            let scene = rtcNewScene(device);
            if scene.is_null() {
                rtcReleaseDevice(device);
                return Err(BackendError::DeviceCreation(
                    "rtcNewScene returned null".to_string(),
                ));
            }

            log::info!("Embree device created");

            Ok(Self {
                handles: EmbreeHandles { device, scene },
                vertex_buffers: Vec::new(),
                index_buffers: Vec::new(),
                triangle_count: 0,
            })
        }
    }
}

impl IntersectionBackend for EmbreeBackend {
    type Committed = EmbreeScene;

    fn attach_triangles(
        &mut self,
        positions: &[Vec3],
        triangles: &[[u32; 3]],
    ) -> Result<GeometryId, BackendError> {
        validate_triangles(positions, triangles)?;

        let mut vertex_data: Vec<f32> = bytemuck::cast_slice(positions).to_vec();
        // Embree reads vertices with 16-byte loads; pad past the last one
        vertex_data.push(0.0);
        let index_data: Vec<u32> = bytemuck::cast_slice(triangles).to_vec();

        let device = self.handles.device;

        // SAFETY: the heap buffers outlive the geometry (they move into self
        // below and then into the committed scene); strides match the formats.
        let geom_id = unsafe {
            let geom = rtcNewGeometry(device, RTCGeometryType::Triangle);
            if geom.is_null() {
                check_device(device)?;
                return Err(BackendError::InvalidGeometry(
                    "rtcNewGeometry returned null".to_string(),
                ));
            }

            rtcSetSharedGeometryBuffer(
                geom,
                RTCBufferType::Vertex as u32,
                0, // slot
                RTCFormat::Float3 as u32,
                vertex_data.as_ptr() as *const c_void,
                0,  // byte offset
                12, // stride: 3 * f32 = 12 bytes per vertex
                positions.len(),
            );
            rtcSetSharedGeometryBuffer(
                geom,
                RTCBufferType::Index as u32,
                0, // slot
                RTCFormat::UInt3 as u32,
                index_data.as_ptr() as *const c_void,
                0,  // byte offset
                12, // stride: 3 * u32 = 12 bytes per triangle
                triangles.len(),
            );

            rtcCommitGeometry(geom);
            let geom_id = rtcAttachGeometry(self.handles.scene, geom);
            rtcReleaseGeometry(geom);

            check_device(device)?;
            geom_id
        };

        log::debug!(
            "Attached Embree geometry {}: {} vertices, {} triangles",
            geom_id,
            positions.len(),
            triangles.len()
        );

        self.vertex_buffers.push(vertex_data);
        self.index_buffers.push(index_data);
        self.triangle_count += triangles.len();

        Ok(GeometryId(geom_id))
    }

    fn commit(self) -> Result<EmbreeScene, BackendError> {
        let EmbreeBackend {
            handles,
            vertex_buffers,
            index_buffers,
            triangle_count,
        } = self;

        // SAFETY: scene handle is live and all geometry is committed
        unsafe { rtcCommitScene(handles.scene) };
        check_device(handles.device)?;

        let committed = EmbreeScene {
            handles,
            geometry_count: vertex_buffers.len(),
            _vertex_buffers: vertex_buffers,
            _index_buffers: index_buffers,
            triangle_count,
        };

        let bounds = committed.bounds();
        log::info!(
            "Embree scene committed: {} geometries, {} triangles",
            committed.geometry_count,
            committed.triangle_count
        );
        log::info!(
            "Scene bounds: ({}, {}, {}) to ({}, {}, {})",
            bounds.x.min,
            bounds.y.min,
            bounds.z.min,
            bounds.x.max,
            bounds.y.max,
            bounds.z.max
        );

        Ok(committed)
    }
}

// ============================================================================
// EmbreeScene - committed, query-only
// ============================================================================

pub struct EmbreeScene {
    handles: EmbreeHandles,

    // Keep vertex and index data alive (Embree holds pointers to this)
    _vertex_buffers: Vec<Vec<f32>>,
    _index_buffers: Vec<Vec<u32>>,

    geometry_count: usize,
    triangle_count: usize,
}

impl EmbreeScene {
    pub fn geometry_count(&self) -> usize {
        self.geometry_count
    }

    pub fn triangle_count(&self) -> usize {
        self.triangle_count
    }
}

impl CommittedScene for EmbreeScene {
    fn intersect(&self, ray: &Ray) -> Option<SurfaceHit> {
        let mut rayhit = RTCRayHit::from_ray(ray);

        // SAFETY: committed scene, rayhit is a properly aligned local
        unsafe { rtcIntersect1(self.handles.scene, &mut rayhit, std::ptr::null()) };

        if rayhit.hit.geom_id == RTC_INVALID_GEOMETRY_ID {
            return None;
        }

        Some(SurfaceHit {
            geometry_id: GeometryId(rayhit.hit.geom_id),
            t: rayhit.ray.tfar,
            // Embree returns geometric normal (not interpolated)
            normal: Vec3::new(rayhit.hit.ng_x, rayhit.hit.ng_y, rayhit.hit.ng_z),
        })
    }

    fn occluded(&self, ray: &Ray) -> bool {
        let mut embree_ray = RTCRay::from_ray(ray);

        // SAFETY: committed scene, ray is a properly aligned local
        unsafe { rtcOccluded1(self.handles.scene, &mut embree_ray, std::ptr::null()) };

        // tfar is set to -inf when an occluder is found
        embree_ray.tfar == f32::NEG_INFINITY
    }

    fn bounds(&self) -> Aabb {
        if self.triangle_count == 0 {
            return Aabb::EMPTY;
        }

        let mut bounds = RTCBounds::default();
        // SAFETY: committed scene handle
        unsafe { rtcGetSceneBounds(self.handles.scene, &mut bounds) };

        Aabb::from_points(
            Vec3::new(bounds.lower_x, bounds.lower_y, bounds.lower_z),
            Vec3::new(bounds.upper_x, bounds.upper_y, bounds.upper_z),
        )
    }
}

// ============================================================================
// Safety Notes
// ============================================================================

// SAFETY: EmbreeScene is Send + Sync because:
// - Embree's RTCDevice/RTCScene are thread-safe after rtcCommitScene
// - We store the vertex and index buffers to keep them alive
// - Drop releases Embree resources before Rust data
unsafe impl Send for EmbreeScene {}
unsafe impl Sync for EmbreeScene {}

#[cfg(test)]
mod tests {
    use super::*;
    use glint_math::Interval;

    #[test]
    fn test_embree_hit_and_occlusion() {
        let mut backend = EmbreeBackend::new().unwrap();
        let positions = [
            Vec3::new(-1.0, -1.0, -2.0),
            Vec3::new(1.0, -1.0, -2.0),
            Vec3::new(0.0, 1.0, -2.0),
        ];
        let id = backend.attach_triangles(&positions, &[[0, 1, 2]]).unwrap();
        let scene = backend.commit().unwrap();

        let hit = scene.intersect(&Ray::new(Vec3::ZERO, Vec3::NEG_Z)).unwrap();
        assert_eq!(hit.geometry_id, id);
        assert!((hit.t - 2.0).abs() < 1e-4);

        let blocked = Ray::with_bounds(Vec3::ZERO, Vec3::NEG_Z, Interval::new(0.01, 3.0));
        let short = Ray::with_bounds(Vec3::ZERO, Vec3::NEG_Z, Interval::new(0.01, 1.0));
        assert!(scene.occluded(&blocked));
        assert!(!scene.occluded(&short));
    }
}
