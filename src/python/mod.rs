//! Python bindings for offline analysis.
//!
//! # Quick Start
//!
//! ```python
//! import santorini_sync as santorini
//!
//! session = santorini.Session()
//! for action_id, probability, evaluation in session.advise(shortlist=True):
//!     print(santorini.Session.describe(action_id), probability, evaluation)
//!
//! session.play(session.legal_actions()[0])
//! session.undo_to_previous_move(0)
//! ```

use pyo3::prelude::*;

mod py_nn;
mod py_session;

pub use py_nn::*;
pub use py_session::*;

#[pymodule]
fn santorini_sync(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PySession>()?;
    m.add_class::<PyEncodedState>()?;
    m.add_class::<PyPolicyValueNetwork>()?;
    m.add("ACTION_SPACE_SIZE", crate::codec::ACTION_SPACE_SIZE)?;
    m.add("WIRE_VERSION", crate::core::WIRE_VERSION)?;
    Ok(())
}
