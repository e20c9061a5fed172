//! The capability model parsed out of an ECU's init response.

use crate::parameters::{DerivedParameter, Parameter, DERIVED_PARAMETERS, PARAMETERS};
use crate::protocol::Packet;

/// What an ECU reported about itself during init: its identifiers and the
/// parameters it supports. Immutable once parsed; discarded with the
/// connection.
#[derive(Debug)]
pub struct Ecu {
    pub ssm_id: [u8; 3],
    pub rom_id: [u8; 5],
    /// Supported primitive parameters, in catalogue order.
    pub supported_parameters: Vec<&'static Parameter>,
    /// Derived parameters whose dependencies are all supported, in
    /// catalogue order.
    pub supported_derived_parameters: Vec<&'static DerivedParameter>,
}

impl Ecu {
    /// Parses an init response packet.
    ///
    /// The data layout is `SSM_ID[3] || ROM_ID[5] || capability bytes`.
    /// Capability byte indices in the parameter catalogue count from the
    /// start of the data, so the first capability byte is index 8. A
    /// parameter whose capability byte lies beyond the received data is
    /// unsupported.
    pub fn from_init_response(packet: &Packet) -> Self {
        let data = packet.data();

        let mut ssm_id = [0u8; 3];
        let n = ssm_id.len().min(data.len());
        ssm_id[..n].copy_from_slice(&data[..n]);

        let mut rom_id = [0u8; 5];
        if data.len() > 3 {
            let n = rom_id.len().min(data.len() - 3);
            rom_id[..n].copy_from_slice(&data[3..3 + n]);
        }

        let supported_parameters: Vec<&'static Parameter> = PARAMETERS
            .iter()
            .filter(|p| {
                p.capability.byte < data.len()
                    && data[p.capability.byte] & (1 << p.capability.bit) != 0
            })
            .collect();

        let supported_derived_parameters: Vec<&'static DerivedParameter> = DERIVED_PARAMETERS
            .iter()
            .filter(|d| {
                d.depends_on
                    .iter()
                    .all(|dep| supported_parameters.iter().any(|p| p.id == *dep))
            })
            .collect();

        Ecu {
            ssm_id,
            rom_id,
            supported_parameters,
            supported_derived_parameters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Command, Device};

    fn init_response(data: &[u8]) -> Packet {
        Packet::new(Device::Engine, Device::DiagnosticTool, Command::InitResponse, data)
    }

    #[test]
    fn parses_ids_and_capabilities() {
        let data = [
            0x02, 0x03, 0x04, // SSM id
            0x10, 0x40, 0xA1, 0x32, 0xB1, // ROM id
            0b0000_0001, // byte 8: P8 (and its aliases P239, P240, P241)
            0b0001_0000, // byte 9: P12
        ];
        let ecu = Ecu::from_init_response(&init_response(&data));

        assert_eq!(ecu.ssm_id, [0x02, 0x03, 0x04]);
        assert_eq!(ecu.rom_id, [0x10, 0x40, 0xA1, 0x32, 0xB1]);

        let ids: Vec<_> = ecu.supported_parameters.iter().map(|p| p.id).collect();
        assert_eq!(ids, ["P8", "P12", "P239", "P240", "P241"]);

        let derived_ids: Vec<_> = ecu
            .supported_derived_parameters
            .iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(derived_ids, ["P200"]);
    }

    #[test]
    fn empty_payload_yields_no_capabilities() {
        let ecu = Ecu::from_init_response(&init_response(&[]));
        assert!(ecu.supported_parameters.is_empty());
        assert!(ecu.supported_derived_parameters.is_empty());
        assert_eq!(ecu.ssm_id, [0, 0, 0]);
        assert_eq!(ecu.rom_id, [0, 0, 0, 0, 0]);
    }

    #[test]
    fn capability_resolution_is_monotone() {
        // caps1 is a bit-wise subset of caps2, so its supported sets must be
        // subsets as well
        let mut data1 = vec![0u8; 80];
        let mut data2 = vec![0u8; 80];
        data1[8] = 0b0000_0001;
        data2[8] = 0b0001_0101;
        data2[9] = 0b1111_0000;

        let ecu1 = Ecu::from_init_response(&init_response(&data1));
        let ecu2 = Ecu::from_init_response(&init_response(&data2));

        for p in &ecu1.supported_parameters {
            assert!(ecu2.supported_parameters.iter().any(|q| q.id == p.id));
        }
        for d in &ecu1.supported_derived_parameters {
            assert!(ecu2
                .supported_derived_parameters
                .iter()
                .any(|q| q.id == d.id));
        }
    }
}
