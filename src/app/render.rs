use std::fmt::Write as _;

use crate::domain::equipment_status::{EquipmentStatus, STATUS_LAYOUT, StatusWords};
use crate::domain::hierarchy::{HierarchyCycleError, ROOT_PARENT_ID, build_forest, render};
use crate::domain::links::PlayerLinks;
use crate::domain::models::{Alarm, AlarmPage, VehicleInfo};

pub const SEPARATOR_WIDTH: usize = 60;

pub const DOWNGRADED_TRUST_NOTICE: &str =
    "WARNING: server certificate could not be verified, data was fetched without TLS verification";

pub fn separator() -> String {
    "-".repeat(SEPARATOR_WIDTH)
}

pub fn alarm_block(alarm: &Alarm) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Device: {}", alarm.device_id);
    let _ = writeln!(out, "Time: {}", alarm.time);
    let _ = writeln!(out, "Type: {}", alarm.alarm_type);
    let _ = writeln!(out, "Description: {}", alarm.description);
    if alarm.gps.has_fix() {
        let _ = writeln!(
            out,
            "Location: {:.6}, {:.6}",
            alarm.gps.latitude(),
            alarm.gps.longitude()
        );
        let _ = writeln!(
            out,
            "Mapped Location: {}, {}",
            alarm.gps.mapped_latitude, alarm.gps.mapped_longitude
        );
        let _ = writeln!(out, "Speed: {:.1} km/h", alarm.gps.speed_kmh());
    }
    let status = if alarm.is_processed() {
        "Processed"
    } else {
        "Unprocessed"
    };
    let _ = writeln!(out, "Status: {status}");
    let _ = writeln!(out, "{}", separator());
    out
}

pub fn alarm_report(heading: &str, page: &AlarmPage) -> String {
    let mut out = format!("=== {heading} ===\n");
    if page.alarms.is_empty() {
        out.push_str("No alarms found for this device\n");
        return out;
    }

    let _ = writeln!(out, "Found {} alarms\n", page.alarms.len());
    for alarm in &page.alarms {
        out.push_str(&alarm_block(alarm));
    }
    out
}

pub fn device_links(name: &str, links: &PlayerLinks) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Device: {name}");
    for (label, url) in links.labeled() {
        let _ = writeln!(out, "  {label}: {url}");
    }
    let _ = writeln!(out, "{}", separator());
    out
}

pub fn vehicle_info(info: &VehicleInfo) -> Result<String, HierarchyCycleError> {
    let mut out = String::from("=== COMPANY HIERARCHY ===\n");
    out.push_str(&render(&build_forest(&info.companies), ROOT_PARENT_ID, "")?);
    out.push('\n');

    out.push_str("=== VEHICLE INFORMATION ===\n");
    for vehicle in &info.vehicles {
        let _ = writeln!(out, "Vehicle: {} (ID: {})", vehicle.name, vehicle.id);
        let _ = writeln!(out, "  Company: {}", vehicle.company_name);
        let _ = writeln!(
            out,
            "  Type: {}, Band: {}, Color: {}",
            vehicle.vehicle_type, vehicle.brand, vehicle.color
        );
        let _ = writeln!(out, "  Owner: {}", vehicle.owner_name);
        let _ = writeln!(
            out,
            "  Engine #: {}, Frame #: {}",
            vehicle.engine_number, vehicle.frame_number
        );
        out.push_str("  Devices:\n");
        for device in &vehicle.devices {
            let _ = writeln!(out, "    - {} ({})", device.id, device.sim);
            let _ = writeln!(
                out,
                "      Channels: {}, Channel Name: {}",
                device.channels, device.channel_names
            );
            let _ = writeln!(out, "      Installed: {}", device.install_time);
        }
        let _ = writeln!(out, "{}", separator());
    }
    Ok(out)
}

pub fn status_report(words: StatusWords) -> String {
    let status = EquipmentStatus::decode(words);
    let mut out = String::new();
    let summary = status.summary();
    let _ = writeln!(
        out,
        "Summary: {}",
        if summary.is_empty() { "-" } else { &summary }
    );
    let _ = writeln!(out, "Positioning: {:?}", status.positioning());
    let _ = writeln!(out, "Coordinates: {}", status.coordinate_system().label());
    for field in STATUS_LAYOUT {
        let _ = writeln!(
            out,
            "  {:?}[{}..{}] {} = {}",
            field.word,
            field.shift,
            field.shift + field.width - 1,
            field.name,
            field.extract(words)
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{alarm_block, alarm_report, status_report, vehicle_info};
    use crate::domain::equipment_status::StatusWords;
    use crate::domain::models::{
        Alarm, AlarmGps, AlarmPage, Company, Vehicle, VehicleDevice, VehicleInfo,
    };

    fn located_alarm() -> Alarm {
        Alarm {
            device_id: "10001".to_string(),
            description: "Emergency button".to_string(),
            alarm_type: 2,
            time: "2024-05-01 10:00:00".to_string(),
            handled: 1,
            gps: AlarmGps {
                raw_latitude: 22_543_096,
                raw_longitude: 114_057_865,
                mapped_latitude: "22.540".to_string(),
                mapped_longitude: "114.050".to_string(),
                raw_speed: 653,
                ..AlarmGps::default()
            },
            ..Alarm::default()
        }
    }

    #[test]
    fn renders_located_alarm_block() {
        assert_eq!(
            alarm_block(&located_alarm()),
            format!(
                "Device: 10001\nTime: 2024-05-01 10:00:00\nType: 2\nDescription: Emergency button\n\
                 Location: 22.543096, 114.057865\nMapped Location: 22.540, 114.050\n\
                 Speed: 65.3 km/h\nStatus: Processed\n{}\n",
                "-".repeat(60)
            )
        );
    }

    #[test]
    fn omits_location_without_fix() {
        let block = alarm_block(&Alarm {
            device_id: "10002".to_string(),
            ..Alarm::default()
        });

        assert!(!block.contains("Location"));
        assert!(block.contains("Status: Unprocessed\n"));
    }

    #[test]
    fn empty_report_says_so() {
        assert_eq!(
            alarm_report("DEVICE ALARMS", &AlarmPage::default()),
            "=== DEVICE ALARMS ===\nNo alarms found for this device\n"
        );
    }

    #[test]
    fn report_counts_alarms() {
        let page = AlarmPage {
            alarms: vec![located_alarm(), located_alarm()],
            ..AlarmPage::default()
        };

        let report = alarm_report("DEVICE ALARMS", &page);

        assert!(report.starts_with("=== DEVICE ALARMS ===\nFound 2 alarms\n\nDevice: 10001\n"));
    }

    #[test]
    fn renders_company_tree_and_vehicles() {
        let info = VehicleInfo {
            companies: vec![
                Company {
                    id: 7,
                    name: "Fleet North".to_string(),
                    parent_id: 2,
                },
                Company {
                    id: 9,
                    name: "Depot A".to_string(),
                    parent_id: 7,
                },
            ],
            vehicles: vec![Vehicle {
                id: 31,
                name: "Truck 31".to_string(),
                company_id: 9,
                company_name: "Depot A".to_string(),
                devices: vec![VehicleDevice {
                    id: "10031".to_string(),
                    channels: 4,
                    channel_names: "CH1".to_string(),
                    sim: "555".to_string(),
                    install_time: "2024-01-02".to_string(),
                }],
                vehicle_type: "Truck".to_string(),
                color: "White".to_string(),
                brand: "Volvo".to_string(),
                owner_name: "J. Doe".to_string(),
                engine_number: "E-1".to_string(),
                frame_number: "F-1".to_string(),
            }],
        };

        let rendered = vehicle_info(&info).expect("acyclic hierarchy");

        assert!(rendered.starts_with(
            "=== COMPANY HIERARCHY ===\n└── Fleet North\n    └── Depot A\n\n=== VEHICLE INFORMATION ===\n"
        ));
        assert!(rendered.contains("Vehicle: Truck 31 (ID: 31)\n"));
        assert!(rendered.contains("  Type: Truck, Band: Volvo, Color: White\n"));
        assert!(rendered.contains("    - 10031 (555)\n      Channels: 4, Channel Name: CH1\n"));
    }

    #[test]
    fn cyclic_company_data_is_reported() {
        let info = VehicleInfo {
            companies: vec![Company {
                id: 2,
                name: "Loop".to_string(),
                parent_id: 2,
            }],
            vehicles: Vec::new(),
        };

        assert!(vehicle_info(&info).is_err());
    }

    #[test]
    fn status_report_lists_summary_and_fields() {
        let report = status_report(StatusWords::from_signed(3, 0, 0, 8));

        assert!(report.starts_with("Summary: GPS Valid, ACC On, ALARMS: Emergency\n"));
        assert!(report.contains("  S1[8..9] hard_drive_status = 0\n"));
        assert!(report.contains("  S4[3..3] emergency = 1\n"));
    }
}
