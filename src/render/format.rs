/// Format seconds as `MM:SS.mmm`. Minutes wrap at the hour, lap times never get there.
pub fn format_lap_time(seconds: f64) -> String {
    let millis = (seconds * 1000.).round() as i64;
    let minutes = millis.div_euclid(60_000).rem_euclid(60);
    let secs = millis.rem_euclid(60_000) as f64 / 1000.;
    format!("{:02}:{:06.3}", minutes, secs)
}
