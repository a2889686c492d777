pub(crate) mod clock;
pub(crate) mod compositor;
pub(crate) mod cpu;
pub(crate) mod fit;
pub(crate) mod frame;
