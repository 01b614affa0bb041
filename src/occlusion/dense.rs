//! Dense 3D array addressed by integer cell indices.

use crate::core::types::IVec3;

/// Flat-buffer 3D array with bounds-checked `(x, y, z)` access.
#[derive(Debug, Clone)]
pub struct Dense3<T> {
    cells: Vec<T>,
    size: IVec3,
}

impl<T> Dense3<T> {
    /// Fill every cell by calling `f` with its index, x fastest.
    pub fn populate_from(size: IVec3, mut f: impl FnMut(IVec3) -> T) -> Self {
        let mut cells = Vec::with_capacity(size.element_product().max(0) as usize);
        for z in 0..size.z {
            for y in 0..size.y {
                for x in 0..size.x {
                    cells.push(f(IVec3::new(x, y, z)));
                }
            }
        }
        Self { cells, size }
    }

    pub fn size(&self) -> IVec3 {
        self.size
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, pos: IVec3) -> bool {
        pos.cmpge(IVec3::ZERO).all() && pos.cmplt(self.size).all()
    }

    fn idx(&self, pos: IVec3) -> Option<usize> {
        if self.contains(pos) {
            Some(((pos.z * self.size.y + pos.y) * self.size.x + pos.x) as usize)
        } else {
            None
        }
    }

    pub fn get(&self, pos: IVec3) -> Option<&T> {
        self.cells.get(self.idx(pos)?)
    }

    pub fn get_mut(&mut self, pos: IVec3) -> Option<&mut T> {
        let idx = self.idx(pos)?;
        self.cells.get_mut(idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = (IVec3, &T)> + '_ {
        let (w, h) = (self.size.x, self.size.y);
        self.cells.iter().enumerate().map(move |(i, cell)| {
            let i = i as i32;
            (IVec3::new(i % w, (i / w) % h, i / (w * h)), cell)
        })
    }
}
