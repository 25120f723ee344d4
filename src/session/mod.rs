//! Interactive GATT session.
//!
//! Drives one connected SMP290 device through a small state machine: build
//! the characteristic catalog, then let the operator read, write and list
//! characteristics by name until they exit.

pub mod operator;
pub mod pin_select;

use tracing::{debug, info, warn};

use crate::ble::characteristics::CharacteristicCatalog;
use crate::ble::transport::GattTransport;
use crate::ble::uuids::{GPIO_PIN_UUID, GPIO_SERVICE_UUID};
use crate::error::Result;
use crate::protocol::values::decode_value;
use crate::utils::parse_byte_list;

pub use operator::{ConsoleOperator, Operator};
pub use pin_select::{requires_pin_selection, select_pin};

/// State of an interactive session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    /// Reading the user descriptions of all characteristics.
    #[default]
    BuildCatalog,
    /// Waiting for the operator to pick an action.
    Idle,
    /// Reading a characteristic.
    Read,
    /// Writing a characteristic.
    Write,
    /// Listing the catalog.
    ListCharacteristics,
    /// Session finished.
    Exit,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BuildCatalog => write!(f, "BuildCatalog"),
            Self::Idle => write!(f, "Idle"),
            Self::Read => write!(f, "Read"),
            Self::Write => write!(f, "Write"),
            Self::ListCharacteristics => write!(f, "ListCharacteristics"),
            Self::Exit => write!(f, "Exit"),
        }
    }
}

/// Check if writing a characteristic asks the operator for the new value.
///
/// Other characteristics are written with a single zero byte, which
/// triggers the action behind them.
pub fn takes_value_entry(name: &str) -> bool {
    name.contains("GPIO") || name.contains("TSD") || name.contains("TX power")
}

/// An interactive session with one connected device.
pub struct Session<T, O> {
    transport: T,
    operator: O,
    catalog: CharacteristicCatalog,
    state: SessionState,
}

impl<T: GattTransport, O: Operator> Session<T, O> {
    /// Create a session in the [`SessionState::BuildCatalog`] state.
    pub fn new(transport: T, operator: O) -> Self {
        Self {
            transport,
            operator,
            catalog: CharacteristicCatalog::new(),
            state: SessionState::default(),
        }
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The catalog built for the connected device.
    pub fn catalog(&self) -> &CharacteristicCatalog {
        &self.catalog
    }

    /// The transport the session talks through.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The operator driving the session.
    pub fn operator(&self) -> &O {
        &self.operator
    }

    /// Run until the operator exits.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be built or the operator's
    /// input fails. Operator mistakes and failed reads or writes return the
    /// session to idle instead.
    pub async fn run(&mut self) -> Result<()> {
        while self.state != SessionState::Exit {
            self.step().await?;
        }
        info!("Session finished");
        Ok(())
    }

    /// Run the handler of the current state once.
    pub async fn step(&mut self) -> Result<SessionState> {
        let result = match self.state {
            SessionState::BuildCatalog => self.build_catalog().await,
            SessionState::Idle => self.idle().await,
            SessionState::Read => self.read().await,
            SessionState::Write => self.write().await,
            SessionState::ListCharacteristics => Ok(self.list_characteristics()),
            SessionState::Exit => Ok(SessionState::Exit),
        };

        let next = match result {
            Ok(next) => next,
            Err(e) if e.is_recoverable() && self.state != SessionState::BuildCatalog => {
                warn!("{} failed: {}", self.state, e);
                self.operator
                    .show(&format!("{}. Returning to idle state.", e));
                SessionState::Idle
            }
            Err(e) => return Err(e),
        };

        if next != self.state {
            debug!("Session state changed: {} -> {}", self.state, next);
        }
        self.state = next;
        Ok(next)
    }

    async fn build_catalog(&mut self) -> Result<SessionState> {
        info!("Building characteristic catalog");
        self.catalog = CharacteristicCatalog::build(&self.transport).await?;
        Ok(SessionState::Idle)
    }

    async fn idle(&mut self) -> Result<SessionState> {
        let input = self
            .operator
            .ask("Enter (read, write, chars or exit): ")
            .await?;

        Ok(match input.trim().to_lowercase().as_str() {
            "read" => SessionState::Read,
            "write" => SessionState::Write,
            "chars" => SessionState::ListCharacteristics,
            "exit" => SessionState::Exit,
            "pin" => {
                let pin = self
                    .transport
                    .read_characteristic(&GPIO_PIN_UUID, &GPIO_SERVICE_UUID)
                    .await?;
                self.operator.show(&format!("GPIO pin: {:?}", pin));
                SessionState::Idle
            }
            _ => {
                self.operator.show("Invalid choice. Staying in idle state.");
                SessionState::Idle
            }
        })
    }

    fn list_characteristics(&mut self) -> SessionState {
        self.operator.show("Listing SMP290 characteristics:");
        let names = self.catalog.names().join(", ");
        self.operator.show(&names);
        SessionState::Idle
    }

    async fn read(&mut self) -> Result<SessionState> {
        let name = self
            .operator
            .ask("What characteristic would you like to read? ")
            .await?;
        let name = name.trim();
        let entry = self.catalog.resolve(name)?;

        if requires_pin_selection(name) {
            select_pin(&self.transport, &mut self.operator, &self.catalog, name).await?;
        }

        let data = self
            .transport
            .read_characteristic(&entry.characteristic, &entry.service)
            .await?;
        info!("{} characteristic value: {:?}", name, data);

        self.show_decoded(name, &data);
        Ok(SessionState::Idle)
    }

    async fn write(&mut self) -> Result<SessionState> {
        let name = self
            .operator
            .ask("What characteristic would you like to write? ")
            .await?;
        let name = name.trim();
        let entry = self.catalog.resolve(name)?;

        if requires_pin_selection(name) {
            select_pin(&self.transport, &mut self.operator, &self.catalog, name).await?;
            self.operator
                .show(&format!("Now set new value for {} characteristic", name));
        }

        let entered = takes_value_entry(name);
        let value = if entered {
            let input = self.operator.ask("New value: ").await?;
            parse_byte_list(&input)?
        } else {
            vec![0]
        };

        self.transport
            .write_characteristic(&entry.characteristic, &entry.service, &value)
            .await?;
        let read_back = self
            .transport
            .read_characteristic(&entry.characteristic, &entry.service)
            .await?;

        let outcome = if !entered {
            format!("{} characteristic value is: {:?}", name, read_back)
        } else if read_back == value {
            format!(
                "{} characteristic value change SUCCESSFUL, value changed to: {:?}",
                name, value
            )
        } else {
            format!(
                "{} characteristic value change FAILED, value remains: {:?}",
                name, read_back
            )
        };
        info!("{}", outcome);
        self.operator.show(&outcome);

        self.show_decoded(name, &read_back);
        Ok(SessionState::Idle)
    }

    fn show_decoded(&mut self, name: &str, data: &[u8]) {
        for line in decode_value(name, data).lines() {
            self.operator.show(&line);
        }
    }
}
