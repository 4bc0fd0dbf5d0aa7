use super::error::Error;

/// Triclinic cell as edge lengths and angles: `[a, b, c, alpha, beta, gamma]`,
/// angles in degrees. Lengths carry whatever unit the source file uses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitCell {
    pub dimensions: [f32; 6],
}

impl UnitCell {
    pub fn new(dimensions: [f32; 6]) -> Self {
        Self { dimensions }
    }

    /// Orthorhombic cell with right angles.
    pub fn orthorhombic(a: f32, b: f32, c: f32) -> Self {
        Self::new([a, b, c, 90.0, 90.0, 90.0])
    }

    /// Converts three cell vectors (rows) into lengths and angles.
    pub fn from_vectors(vectors: [[f64; 3]; 3]) -> Self {
        let [a, b, c] = vectors;
        let (len_a, len_b, len_c) = (norm(&a), norm(&b), norm(&c));
        let angle = |u: &[f64; 3], v: &[f64; 3], lu: f64, lv: f64| {
            if lu == 0.0 || lv == 0.0 {
                return 90.0;
            }
            (dot(u, v) / (lu * lv)).clamp(-1.0, 1.0).acos().to_degrees()
        };

        Self::new([
            len_a as f32,
            len_b as f32,
            len_c as f32,
            angle(&b, &c, len_b, len_c) as f32,
            angle(&a, &c, len_a, len_c) as f32,
            angle(&a, &b, len_a, len_b) as f32,
        ])
    }

    #[inline]
    pub fn lengths(&self) -> [f32; 3] {
        [self.dimensions[0], self.dimensions[1], self.dimensions[2]]
    }

    #[inline]
    pub fn angles(&self) -> [f32; 3] {
        [self.dimensions[3], self.dimensions[4], self.dimensions[5]]
    }
}

fn dot(u: &[f64; 3], v: &[f64; 3]) -> f64 {
    u[0] * v[0] + u[1] * v[1] + u[2] * v[2]
}

fn norm(v: &[f64; 3]) -> f64 {
    dot(v, v).sqrt()
}

/// One time sample of per-atom state.
///
/// Coordinates are stored as `f32` whatever the precision of the input text;
/// digits beyond single precision are not recoverable.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    /// Position of this frame in its trajectory, starting at 0.
    pub index: usize,
    pub positions: Vec<[f32; 3]>,
    pub velocities: Option<Vec<[f32; 3]>>,
    pub forces: Option<Vec<[f32; 3]>>,
    pub unit_cell: Option<UnitCell>,
}

impl Frame {
    pub fn new(index: usize, positions: Vec<[f32; 3]>) -> Self {
        Self {
            index,
            positions,
            ..Self::default()
        }
    }

    pub fn with_velocities(mut self, velocities: Vec<[f32; 3]>) -> Self {
        self.velocities = Some(velocities);
        self
    }

    pub fn with_forces(mut self, forces: Vec<[f32; 3]>) -> Self {
        self.forces = Some(forces);
        self
    }

    pub fn with_unit_cell(mut self, unit_cell: UnitCell) -> Self {
        self.unit_cell = Some(unit_cell);
        self
    }

    #[inline]
    pub fn n_atoms(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn has_velocities(&self) -> bool {
        self.velocities.is_some()
    }

    #[inline]
    pub fn has_forces(&self) -> bool {
        self.forces.is_some()
    }

    /// Checks every per-atom array against an atom count.
    pub fn check_atoms(&self, n_atoms: usize) -> Result<(), Error> {
        let arrays = [
            ("positions", Some(&self.positions)),
            ("velocities", self.velocities.as_ref()),
            ("forces", self.forces.as_ref()),
        ];
        for (field, array) in arrays {
            if let Some(array) = array
                && array.len() != n_atoms
            {
                return Err(Error::FrameTopologyMismatch {
                    field,
                    expected: n_atoms,
                    found: array.len(),
                });
            }
        }
        Ok(())
    }

    /// Clears per-atom data so the buffer can be refilled for another frame.
    pub(crate) fn reset(&mut self, index: usize) {
        self.index = index;
        self.positions.clear();
        self.velocities = None;
        self.forces = None;
        self.unit_cell = None;
    }
}
