//! Value injection
//!
//! Reactive frameworks ignore a bare property write; they synchronize their
//! state from the events fired around it. Each element kind therefore gets the
//! event sequence a user typing into it would produce:
//!
//! `focus` -> clear -> set -> `blur`
//!
//! | kind         | clear                      | set                                  |
//! |--------------|----------------------------|--------------------------------------|
//! | form control | `value = ""`, `input`      | `value = v`, `input`, `change`       |
//! | editable     | `textContent = ""`         | `textContent = v`, `input`           |
//! | other        | -                          | `value` attribute, no events         |

use std::time::Duration;

use crate::clock::Clock;
use crate::dom::{DomElement, DomEvent, ElementKind};
use crate::error::DomError;
use crate::locator::Target;

/// Fill a located element, giving an invisible one a single short grace
/// period first. Still-invisible elements are filled anyway.
pub async fn inject<E, C>(
    target: &Target<E>,
    value: &str,
    clock: &C,
    visibility_retry: Duration,
) -> Result<(), DomError>
where
    E: DomElement,
    C: Clock + ?Sized,
{
    if !target.element.is_visible() {
        clock.sleep(visibility_retry).await;
        if !target.element.is_visible() {
            log::debug!("Filling element that is still not visible");
        }
    }
    fill(target, value)
}

/// Run the focus/clear/set/blur sequence synchronously.
pub fn fill<E: DomElement>(target: &Target<E>, value: &str) -> Result<(), DomError> {
    let element = &target.element;

    element.focus()?;
    element.dispatch(DomEvent::Focus)?;

    match target.kind {
        ElementKind::FormControl => {
            element.set_value("")?;
            element.dispatch(DomEvent::Input)?;
            element.set_value(value)?;
            element.dispatch(DomEvent::Input)?;
            element.dispatch(DomEvent::Change)?;
        }
        ElementKind::Editable => {
            element.set_text_content("")?;
            element.set_text_content(value)?;
            element.dispatch(DomEvent::Input)?;
        }
        ElementKind::Other => {
            element.set_value_attribute(value)?;
        }
    }

    element.dispatch(DomEvent::Blur)
}
