//! Device management

use anyhow::Result;
use clap::Subcommand;
use tracing::info;

use crate::init::Backend;

#[derive(Subcommand)]
pub enum DevicesCommand {
    /// List registered devices
    List,
    /// Register a device by serial number
    Add {
        /// Serial number printed on the device
        serial_number: String,
    },
}

impl DevicesCommand {
    pub async fn run(self, backend: &Backend) -> Result<()> {
        match self {
            DevicesCommand::List => {
                for device in backend.client.list_devices().await? {
                    println!("{}\t{}", device.device_id, device.serial_number);
                }
            }
            DevicesCommand::Add { serial_number } => {
                backend.client.add_device(&serial_number).await?;
                info!(serial_number = %serial_number, "Added device");
                println!("Added device {}", serial_number);
            }
        }
        Ok(())
    }
}
