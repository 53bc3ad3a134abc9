pub mod descriptor;
pub mod intent;
pub mod operation;
pub mod period;
