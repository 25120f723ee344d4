//! GPIO pin selection.
//!
//! The GPIO characteristics are multiplexed across the sensor's pins: the
//! `GPIO pin` characteristic selects which pin a following read or write of
//! another GPIO characteristic applies to.

use tracing::{debug, info, warn};

use crate::ble::characteristics::CharacteristicCatalog;
use crate::ble::transport::GattTransport;
use crate::error::{Error, Result};
use crate::protocol::values::CharacteristicKind;
use crate::session::operator::Operator;

/// Pins that can be selected.
pub const SELECTABLE_PINS: [u8; 3] = [0, 1, 4];

/// Pin the drive strength setting always applies to.
pub const DRIVE_STRENGTH_PIN: u8 = 4;

/// Check if accessing a characteristic needs a pin selected first.
pub fn requires_pin_selection(name: &str) -> bool {
    name.contains("GPIO") && name != CharacteristicKind::GpioPin.name()
}

/// Parse an operator's pin choice.
pub fn parse_pin(input: &str) -> Result<u8> {
    input
        .trim()
        .parse::<u8>()
        .ok()
        .filter(|pin| SELECTABLE_PINS.contains(pin))
        .ok_or_else(|| Error::InvalidPinSelection {
            input: input.to_string(),
        })
}

/// Select the pin for a GPIO characteristic.
///
/// Asks the operator for the pin unless the target is the drive strength,
/// writes it to `GPIO pin` and reads it back. A read back that differs from
/// the written pin is logged but does not fail the selection.
///
/// # Errors
///
/// Returns [`Error::InvalidPinSelection`] for a pin outside
/// [`SELECTABLE_PINS`], [`Error::UnknownCharacteristic`] if the device has no
/// `GPIO pin` characteristic, or the transport's error.
pub async fn select_pin<T, O>(
    transport: &T,
    operator: &mut O,
    catalog: &CharacteristicCatalog,
    target: &str,
) -> Result<u8>
where
    T: GattTransport + ?Sized,
    O: Operator + ?Sized,
{
    let pin = if target == CharacteristicKind::GpioDriveStrength.name() {
        DRIVE_STRENGTH_PIN
    } else {
        let input = operator
            .ask("What GPIO pin would you like to choose (0, 1 or 4)? ")
            .await?;
        parse_pin(&input)?
    };

    let selector = catalog.resolve(CharacteristicKind::GpioPin.name())?;
    debug!("Selecting GPIO pin {} for '{}'", pin, target);

    transport
        .write_characteristic(&selector.characteristic, &selector.service, &[pin])
        .await?;
    let read_back = transport
        .read_characteristic(&selector.characteristic, &selector.service)
        .await?;

    if read_back == [pin] {
        info!("GPIO pin {} successfully chosen", pin);
    } else {
        warn!("GPIO pin change failed, GPIO pin remains: {:?}", read_back);
    }

    Ok(pin)
}
