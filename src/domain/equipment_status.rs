//! Decoder for the four vendor status words (`s1`..`s4`).
//!
//! Every field is described once in [`STATUS_LAYOUT`] as a (word, shift,
//! width) triple; the struct, the decoder and the by-name lookup are all
//! generated from that single table.

use crate::domain::models::CoordinateSystem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Word {
    S1,
    S2,
    S3,
    S4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLayout {
    pub name: &'static str,
    pub word: Word,
    pub shift: u32,
    pub width: u32,
}

impl FieldLayout {
    pub fn mask(&self) -> u32 {
        width_mask(self.width)
    }

    pub fn extract(&self, words: StatusWords) -> u32 {
        extract_bits(words.word(self.word), self.shift, self.width)
    }
}

fn width_mask(width: u32) -> u32 {
    if width >= 32 {
        u32::MAX
    } else {
        (1_u32 << width) - 1
    }
}

fn extract_bits(word: u32, shift: u32, width: u32) -> u32 {
    (word >> shift) & width_mask(width)
}

/// Raw status words, held unsigned so bit 31 never sign-extends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusWords {
    pub s1: u32,
    pub s2: u32,
    pub s3: u32,
    pub s4: u32,
}

impl StatusWords {
    pub fn new(s1: u32, s2: u32, s3: u32, s4: u32) -> Self {
        Self { s1, s2, s3, s4 }
    }

    pub fn from_signed(s1: i32, s2: i32, s3: i32, s4: i32) -> Self {
        Self::new(s1 as u32, s2 as u32, s3 as u32, s4 as u32)
    }

    pub fn word(&self, word: Word) -> u32 {
        match word {
            Word::S1 => self.s1,
            Word::S2 => self.s2,
            Word::S3 => self.s3,
            Word::S4 => self.s4,
        }
    }
}

trait FieldValue: Copy {
    fn from_raw(raw: u32) -> Self;
    fn to_raw(self) -> u32;
}

impl FieldValue for bool {
    fn from_raw(raw: u32) -> Self {
        raw != 0
    }

    fn to_raw(self) -> u32 {
        u32::from(self)
    }
}

impl FieldValue for u8 {
    // Layout widths never exceed 8 bits for u8 fields.
    fn from_raw(raw: u32) -> Self {
        (raw & 0xFF) as u8
    }

    fn to_raw(self) -> u32 {
        u32::from(self)
    }
}

macro_rules! status_layout {
    ($($field:ident: $ty:ty = $word:ident[$shift:literal; $width:literal],)+) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        pub struct EquipmentStatus {
            $(pub $field: $ty,)+
        }

        pub const STATUS_LAYOUT: &[FieldLayout] = &[
            $(FieldLayout {
                name: stringify!($field),
                word: Word::$word,
                shift: $shift,
                width: $width,
            },)+
        ];

        impl EquipmentStatus {
            /// Total over every input: each field is masked out of its word.
            pub fn decode(words: StatusWords) -> Self {
                Self {
                    $($field: <$ty as FieldValue>::from_raw(
                        extract_bits(words.word(Word::$word), $shift, $width),
                    ),)+
                }
            }

            pub fn field_value(&self, name: &str) -> Option<u32> {
                match name {
                    $(stringify!($field) => Some(FieldValue::to_raw(self.$field)),)+
                    _ => None,
                }
            }
        }
    };
}

status_layout! {
    gps_valid: bool = S1[0; 1],
    acc_on: bool = S1[1; 1],
    left_turn: bool = S1[2; 1],
    right_turn: bool = S1[3; 1],
    fatigue_warning: bool = S1[4; 1],
    forward_rotation: bool = S1[5; 1],
    reversing: bool = S1[6; 1],
    gps_antenna_present: bool = S1[7; 1],
    hard_drive_status: u8 = S1[8; 2],
    three_g_module_status: u8 = S1[10; 3],
    quiescent: bool = S1[13; 1],
    overspeed: bool = S1[14; 1],
    gps_supplement: bool = S1[15; 1],
    battery_status: bool = S1[16; 1],
    night_mode: bool = S1[17; 1],
    overcrowding: bool = S1[18; 1],
    parking_acc: bool = S1[19; 1],
    io1: bool = S1[20; 1],
    io2: bool = S1[21; 1],
    io3: bool = S1[22; 1],
    io4: bool = S1[23; 1],
    io5: bool = S1[24; 1],
    io6: bool = S1[25; 1],
    io7: bool = S1[26; 1],
    io8: bool = S1[27; 1],
    drive2_status: bool = S1[28; 1],
    hard_disk2_status: u8 = S1[29; 2],
    hard_disk_invalid: bool = S1[31; 1],

    out_of_area: bool = S2[0; 1],
    line: bool = S2[1; 1],
    high_speed_in_area: bool = S2[2; 1],
    low_speed_in_area: bool = S2[3; 1],
    high_speed_outside_area: bool = S2[4; 1],
    low_speed_outside_area: bool = S2[5; 1],
    parking_in_area: bool = S2[6; 1],
    out_of_area_parking: bool = S2[7; 1],
    daily_flow_warning: bool = S2[8; 1],
    daily_flow_exceeded: bool = S2[9; 1],
    monthly_flow_warning: bool = S2[10; 1],
    monthly_flow_exceeded: bool = S2[11; 1],
    backup_battery_powered: bool = S2[12; 1],
    door_open: bool = S2[13; 1],
    vehicle_fortified: bool = S2[14; 1],
    battery_voltage_low: bool = S2[15; 1],
    engine_on: bool = S2[17; 1],
    last_valid_gps: bool = S2[18; 1],
    heavy_load: bool = S2[19; 1],
    operation_shutdown: bool = S2[20; 1],
    lat_lng_not_encrypted: bool = S2[21; 1],
    oil_circuit_disconnected: bool = S2[22; 1],
    circuit_disconnected: bool = S2[23; 1],
    door_locked: bool = S2[24; 1],
    area_overspeed_platform: bool = S2[25; 1],
    area_overspeed_platform2: bool = S2[26; 1],
    into_area_platform: bool = S2[27; 1],
    line_offset: bool = S2[28; 1],
    time_period_overspeed: bool = S2[29; 1],
    time_period_low_speed: bool = S2[30; 1],
    fatigue_driving_platform: bool = S2[31; 1],

    video_lost_channels: u8 = S3[0; 8],
    video_channels: u8 = S3[8; 8],
    io_inputs_9_16: u8 = S3[16; 8],
    io_outputs_1_4: u8 = S3[24; 4],
    positioning_type: u8 = S3[28; 2],
    abnormal_driving: bool = S3[30; 1],
    mountain_forbidden_line: bool = S3[31; 1],

    coordinate_system: u8 = S4[0; 3],
    emergency: bool = S4[3; 1],
    area_overspeed: bool = S4[4; 1],
    fatigue_driving: bool = S4[5; 1],
    dangerous_driving: bool = S4[6; 1],
    gnss_module_fault: bool = S4[7; 1],
    gnss_antenna_disconnected: bool = S4[8; 1],
    gnss_antenna_short_circuit: bool = S4[9; 1],
    terminal_display_fault: bool = S4[10; 1],
    tts_module_fault: bool = S4[11; 1],
    camera_failure: bool = S4[12; 1],
    cumulative_driving_overtime: bool = S4[13; 1],
    overtime_parking: bool = S4[14; 1],
    into_area: bool = S4[15; 1],
    route: bool = S4[16; 1],
    travel_time_abnormal: bool = S4[17; 1],
    route_deviation: bool = S4[18; 1],
    vss_failure: bool = S4[19; 1],
    fuel_quantity_abnormal: bool = S4[20; 1],
    vehicle_theft: bool = S4[21; 1],
    illegal_ignition: bool = S4[22; 1],
    illegal_displacement: bool = S4[23; 1],
    collision_rollover: bool = S4[24; 1],
    overtime_stop: bool = S4[25; 1],
    key_point_not_reached: bool = S4[26; 1],
    line_overspeed: bool = S4[27; 1],
    line_low_speed: bool = S4[28; 1],
    road_overspeed: bool = S4[29; 1],
    out_of_area_platform: bool = S4[30; 1],
    key_point_not_left: bool = S4[31; 1],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Positioning {
    Gps,
    BaseStation,
    Wifi,
    Other(u8),
}

impl EquipmentStatus {
    pub fn from_signed(s1: i32, s2: i32, s3: i32, s4: i32) -> Self {
        Self::decode(StatusWords::from_signed(s1, s2, s3, s4))
    }

    pub fn positioning(&self) -> Positioning {
        match self.positioning_type {
            0 => Positioning::Gps,
            1 => Positioning::BaseStation,
            2 => Positioning::Wifi,
            other => Positioning::Other(other),
        }
    }

    pub fn coordinate_system(&self) -> CoordinateSystem {
        CoordinateSystem::from_code(self.coordinate_system)
    }

    /// Curated one-line description of the notable flags.
    pub fn summary(&self) -> String {
        let states = [
            (self.gps_valid, "GPS Valid"),
            (self.acc_on, "ACC On"),
            (self.left_turn, "Left Turn"),
            (self.right_turn, "Right Turn"),
            (self.quiescent, "Quiescent"),
            (self.overspeed, "Overspeeding"),
            (self.battery_status, "Battery Low"),
            (self.night_mode, "Night Mode"),
            (self.door_open, "Door Open"),
        ];
        let alarms = [
            (self.emergency, "Emergency"),
            (self.area_overspeed, "Area Overspeed"),
            (self.fatigue_driving, "Fatigue Driving"),
            (self.dangerous_driving, "Dangerous Driving"),
            (self.vehicle_theft, "Vehicle Theft"),
            (self.illegal_ignition, "Illegal Ignition"),
            (self.collision_rollover, "Collision/Rollover"),
        ];

        let mut parts: Vec<String> = states
            .iter()
            .filter(|(active, _)| *active)
            .map(|(_, label)| (*label).to_string())
            .collect();

        let active_alarms: Vec<&str> = alarms
            .iter()
            .filter(|(active, _)| *active)
            .map(|(_, label)| *label)
            .collect();
        if !active_alarms.is_empty() {
            parts.push(format!("ALARMS: {}", active_alarms.join(", ")));
        }

        parts.join(", ")
    }
}
