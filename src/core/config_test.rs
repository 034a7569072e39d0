#[cfg(test)]
mod tests {

    use crate::core::AppConfig;
    use std::path::PathBuf;

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert!(config.last_browse_directory.is_none());
        assert!(config.ffmpeg_path.is_none());
        assert!(config.ffprobe_path.is_none());
        // The default output directory is always usable as a dialog start
        assert!(!config.output_directory.as_os_str().is_empty());
    }

    #[test]
    fn test_app_config_serialization() {
        let mut config = AppConfig::default();
        config.output_directory = PathBuf::from("/test/frames");
        config.last_browse_directory = Some(PathBuf::from("/test/videos"));
        config.ffmpeg_path = Some(PathBuf::from("/opt/ffmpeg/bin/ffmpeg"));

        let serialized = serde_json::to_string(&config).expect("Failed to serialize config");
        let deserialized: AppConfig = serde_json::from_str(&serialized).expect("Failed to deserialize config");

        assert_eq!(config.output_directory, deserialized.output_directory);
        assert_eq!(config.last_browse_directory, deserialized.last_browse_directory);
        assert_eq!(config.ffmpeg_path, deserialized.ffmpeg_path);
        assert_eq!(config.ffprobe_path, deserialized.ffprobe_path);
    }

    #[test]
    fn test_config_backward_compatibility() {
        // Test that old config files without new fields can still be loaded
        let old_config_json = r#"{
            "output_directory": "/home/user/Pictures"
        }"#;

        let config: AppConfig = serde_json::from_str(old_config_json).expect("Failed to parse old config");

        assert_eq!(config.output_directory, PathBuf::from("/home/user/Pictures"));
        // Missing fields should have default values
        assert!(config.last_browse_directory.is_none());
        assert!(config.ffmpeg_path.is_none());
        assert!(config.ffprobe_path.is_none());
    }

    #[test]
    fn test_media_tool_paths_fall_back_to_path_lookup() {
        let mut config = AppConfig::default();
        assert_eq!(config.ffmpeg(), PathBuf::from("ffmpeg"));
        assert_eq!(config.ffprobe(), PathBuf::from("ffprobe"));

        config.ffmpeg_path = Some(PathBuf::from("/opt/ffmpeg/bin/ffmpeg"));
        config.ffprobe_path = Some(PathBuf::from("/opt/ffmpeg/bin/ffprobe"));
        assert_eq!(config.ffmpeg(), PathBuf::from("/opt/ffmpeg/bin/ffmpeg"));
        assert_eq!(config.ffprobe(), PathBuf::from("/opt/ffmpeg/bin/ffprobe"));
    }
}
