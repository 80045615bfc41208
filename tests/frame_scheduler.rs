mod tests {
    use embassy_time::{Duration, Instant};
    use sparse_ws2811::{
        FrameScheduler, LedBuffer, ProtocolTolerance, Rgb, SparseBuffer, Transmitter,
        TransmitterConfig, color::BLACK, sim::LogicAnalyzer,
    };

    const RED: Rgb = Rgb { r: 255, g: 0, b: 0 };

    #[test]
    fn test_tick_schedules_next_frame() {
        let analyzer = LogicAnalyzer::<1024>::new();
        let transmitter = Transmitter::bit_bang(
            analyzer.pin(),
            analyzer.clock(),
            &TransmitterConfig::WS2811_8MHZ,
        )
        .unwrap();
        let mut scheduler = FrameScheduler::new(transmitter, SparseBuffer::<8, 16>::new());

        let result = scheduler
            .tick(Instant::from_millis(0), |leds| leds.set(2, RED).unwrap())
            .unwrap();
        assert_eq!(result.next_deadline, Instant::from_millis(25));
        assert_eq!(result.sleep_duration, Duration::from_millis(25));
        assert_eq!(analyzer.pulse_count(), 8 * 24);

        let bytes = analyzer.decode::<32>(&ProtocolTolerance::WS2811).unwrap();
        assert_eq!(&bytes[6..9], &[0, 255, 0]);
        assert_eq!(scheduler.buffer().color_at(2), Ok(RED));
    }

    #[test]
    fn test_tick_within_drift_keeps_schedule() {
        let analyzer = LogicAnalyzer::<1024>::new();
        let transmitter = Transmitter::bit_bang(
            analyzer.pin(),
            analyzer.clock(),
            &TransmitterConfig::WS2811_8MHZ,
        )
        .unwrap();
        let mut scheduler = FrameScheduler::new(transmitter, SparseBuffer::<4, 8>::new());

        scheduler.tick(Instant::from_millis(0), |_| {}).unwrap();
        let result = scheduler.tick(Instant::from_millis(40), |_| {}).unwrap();
        assert_eq!(result.next_deadline, Instant::from_millis(50));
        assert_eq!(result.sleep_duration, Duration::from_millis(10));

        // Late, but less than two frames behind: no sleep, no reset
        let result = scheduler.tick(Instant::from_millis(90), |_| {}).unwrap();
        assert_eq!(result.next_deadline, Instant::from_millis(75));
        assert_eq!(result.sleep_duration, Duration::from_millis(0));
    }

    #[test]
    fn test_tick_resets_after_drift() {
        let analyzer = LogicAnalyzer::<1024>::new();
        let transmitter = Transmitter::bit_bang(
            analyzer.pin(),
            analyzer.clock(),
            &TransmitterConfig::WS2811_8MHZ,
        )
        .unwrap();
        let mut scheduler = FrameScheduler::with_frame_duration(
            transmitter,
            SparseBuffer::<4, 8>::new(),
            Duration::from_millis(25),
        );

        scheduler.tick(Instant::from_millis(0), |_| {}).unwrap();
        let result = scheduler.tick(Instant::from_millis(1000), |_| {}).unwrap();
        assert_eq!(result.next_deadline, Instant::from_millis(1025));
        assert_eq!(result.sleep_duration, Duration::from_millis(25));
    }

    #[test]
    fn test_run_renders_each_frame() {
        let analyzer = LogicAnalyzer::<1024>::new();
        let transmitter = Transmitter::bit_bang(
            analyzer.pin(),
            analyzer.clock(),
            &TransmitterConfig::WS2811_8MHZ,
        )
        .unwrap();
        let mut scheduler = FrameScheduler::new(transmitter, SparseBuffer::<4, 16>::new());
        let mut frames = 0;

        scheduler
            .run(Some(3), &mut analyzer.clock(), |leds| {
                leds.set(frames, RED).unwrap();
                frames += 1;
            })
            .unwrap();

        assert_eq!(frames, 3);
        assert_eq!(analyzer.pulse_count(), 3 * 4 * 24);
        assert!(analyzer.elapsed_ns() >= 3 * 25_000_000);

        let (_, leds) = scheduler.release();
        for position in 0..3 {
            assert_eq!(leds.color_at(position), Ok(RED));
        }
        assert_eq!(leds.color_at(3), Ok(BLACK));
    }
}
