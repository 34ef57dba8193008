//! J1939 source address names (SAE J1939 Appendix B, industry group 0)

/// Name of a preferred source address, or `None` when the address is not assigned
pub fn source_address_name(address: u8) -> Option<&'static str> {
    let name = match address {
        0x00 => "Engine #1",
        0x01 => "Engine #2",
        0x02 => "Turbocharger",
        0x03 => "Transmission #1",
        0x04 => "Transmission #2",
        0x05 => "Shift Console - Primary",
        0x06 => "Shift Console - Secondary",
        0x07 => "Power TakeOff - (Main or Rear)",
        0x08 => "Axle - Steering",
        0x09 => "Axle - Drive #1",
        0x0A => "Axle - Drive #2",
        0x0B => "Brakes - System Controller",
        0x0C => "Brakes - Steer Axle",
        0x0D => "Brakes - Drive axle #1",
        0x0E => "Brakes - Drive Axle #2",
        0x0F => "Retarder - Engine",
        0x10 => "Retarder - Driveline",
        0x11 => "Cruise Control",
        0x12 => "Fuel System",
        0x13 => "Steering Controller",
        0x14 => "Suspension - Steer Axle",
        0x15 => "Suspension - Drive Axle #1",
        0x16 => "Suspension - Drive Axle #2",
        0x17 => "Instrument Cluster #1",
        0x18 => "Trip Recorder",
        0x19 => "Passenger-Operator Climate Control #1",
        0x1A => "Alternator/Electrical Charging System",
        0x1B => "Aerodynamic Control",
        0x1C => "Vehicle Navigation",
        0x1D => "Vehicle Security",
        0x1E => "Electrical System",
        0x1F => "Starter System",
        0x20 => "Tractor-Trailer Bridge #1",
        0x21 => "Body Controller",
        0x22 => "Auxiliary Valve Control or Engine Air System Valve Control",
        0x23 => "Hitch Control",
        0x24 => "Power TakeOff (Front or Secondary)",
        0x25 => "Off Vehicle Gateway",
        0x26 => "Virtual Terminal (in cab)",
        0x27 => "Management Computer #1",
        0x28 => "Cab Display #1",
        0x29 => "Retarder, Exhaust, Engine #1",
        0x2A => "Headway Controller",
        0x2B => "On-Board Diagnostic Unit",
        0x2C => "Retarder, Exhaust, Engine #2",
        0x2D => "Endurance Braking System",
        0x2E => "Hydraulic Pump Controller",
        0x2F => "Suspension - System Controller #1",
        0x30 => "Pneumatic - System Controller",
        0x31 => "Cab Controller - Primary",
        0x32 => "Cab Controller - Secondary",
        0x33 => "Tire Pressure Controller",
        0x34 => "Ignition Control Module #1",
        0x35 => "Ignition Control Module #2",
        0x36 => "Seat Control #1",
        0x37 => "Lighting - Operator Controls",
        0x3D => "Exhaust Emission Controller",
        0x3E => "Vehicle Dynamic Stability Controller",
        0x3F => "Oil Sensor",
        0x55 => "Diesel Particulate Filter Controller",
        0x5A => "Powertrain Control Module",
        0xF9 => "Off Board Diagnostic-Service Tool #1",
        0xFA => "Off Board Diagnostic-Service Tool #2",
        0xFE => "Null",
        0xFF => "Global",
        _ => return None,
    };
    Some(name)
}

/// Display name used in reports, e.g. `"Engine #1 (0)"`
pub fn address_name(address: u8) -> String {
    let name = source_address_name(address).unwrap_or("Unknown");
    format!("{} ({})", name, address)
}
