/// Index into a [`MaterialCatalog`](crate::MaterialCatalog).
///
/// Id 0 is the catalog sentinel: it names no material and is what an
/// untouched block reads back as.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default, PartialOrd, Ord)]
pub struct MaterialId(pub u16);

impl MaterialId {
    pub const NONE: MaterialId = MaterialId(0);

    #[inline]
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}
