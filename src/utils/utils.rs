//! Helper functions

use nalgebra::Vector3;

/// Formats joint values (degrees) as a single row, two decimals each.
pub fn format_joints(joints: &[f64]) -> String {
    let row: Vec<String> = joints.iter().map(|q| format!("{:5.2}", q)).collect();
    format!("[{}]", row.join(" "))
}

/// Print joint values (degrees).
#[allow(dead_code)]
pub fn dump_joints(joints: &[f64]) {
    println!("{}", format_joints(joints));
}

pub fn dump_position(position: &Vector3<f64>) {
    println!("x: {:.5}, y: {:.5}, z: {:.5}", position.x, position.y, position.z);
}
