use waygate_geom::BlockPos;

use crate::types::MaterialId;

/// Host-side block storage. Writes are synchronous and always succeed.
pub trait BlockStore {
    fn get_material(&self, pos: BlockPos) -> MaterialId;
    fn set_material(&mut self, pos: BlockPos, material: MaterialId);
}

impl<T: BlockStore + ?Sized> BlockStore for Box<T> {
    fn get_material(&self, pos: BlockPos) -> MaterialId {
        (**self).get_material(pos)
    }

    fn set_material(&mut self, pos: BlockPos, material: MaterialId) {
        (**self).set_material(pos, material)
    }
}
